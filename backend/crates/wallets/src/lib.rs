//! Wallets Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Wallet entity, currency, repository trait
//! - `application/` - Debit command, customer-completed event, browse query
//! - `infra/` - PostgreSQL and in-memory persistence
//!
//! Every command and event handler is wrapped in a transactional decorator
//! bound to this module's unit of work, so the handlers only ever see an
//! open transaction of the `wallets` schema.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

use std::sync::Arc;

use platform::transaction::{
    ModuleKey, PgStorage, RegistryError, StorageContext, TransactionalCommandHandler,
    TransactionalEventHandler, UnitOfWorkRegistry, UnitOfWorkRegistryBuilder,
};
use sqlx::PgPool;

use crate::application::customer_completed::CustomerCompletedHandler;
use crate::application::debit_wallet::DebitWalletHandler;
use crate::domain::repository::WalletRepository;

// Re-exports for convenience
pub use application::browse_wallets::{BrowseWallets, WalletDto, WalletReadModel};
pub use application::customer_completed::CustomerCompleted;
pub use application::debit_wallet::DebitWallet;
pub use domain::entities::Wallet;
pub use domain::value_objects::Currency;
pub use error::{WalletError, WalletResult};
pub use infra::memory::{MemoryWalletReadModel, MemoryWalletRepository, WalletBook};
pub use infra::postgres::{PgWalletReadModel, PgWalletRepository};

pub const MODULE: ModuleKey = ModuleKey::new("wallets");

/// PostgreSQL schema owned by this module.
pub const SCHEMA: &str = "wallets";

/// Register the Wallets unit of work over the shared pool.
pub fn register_unit_of_work(
    builder: &mut UnitOfWorkRegistryBuilder<PgStorage>,
    pool: PgPool,
) -> Result<(), RegistryError> {
    builder.register_storage(MODULE, Arc::new(PgStorage::new(pool, SCHEMA)))
}

/// The module's handlers, each already decorated with its unit of work.
pub struct WalletHandlers<R, S> {
    pub debit_wallet: TransactionalCommandHandler<DebitWalletHandler<R>, S>,
    pub customer_completed: TransactionalEventHandler<CustomerCompletedHandler<R>, S>,
}

/// Build the decorated handlers once the registry is frozen.
///
/// Fails when the Wallets unit of work was never registered.
pub fn bootstrap<R, S>(
    registry: &UnitOfWorkRegistry<S>,
    repository: R,
) -> Result<WalletHandlers<R, S>, RegistryError>
where
    R: WalletRepository<S::Transaction> + Clone + Send + Sync + 'static,
    S: StorageContext + Sync + 'static,
{
    let handlers = WalletHandlers {
        debit_wallet: TransactionalCommandHandler::new(
            MODULE,
            DebitWalletHandler::new(repository.clone()),
            registry,
        )?,
        customer_completed: TransactionalEventHandler::new(
            MODULE,
            CustomerCompletedHandler::new(repository),
            registry,
        )?,
    };
    tracing::info!(module = %MODULE, "Wallet handlers ready");
    Ok(handlers)
}
