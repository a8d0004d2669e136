//! Repository Traits
//!
//! Every method runs on the transaction handed in by the unit of work, so a
//! handler's reads and writes commit or roll back together.

use kernel::id::{CustomerId, WalletId};

use crate::domain::entities::Wallet;
use crate::domain::value_objects::Currency;
use crate::error::WalletResult;

/// Wallet repository over transaction type `Tx`
#[trait_variant::make(WalletRepository: Send)]
pub trait LocalWalletRepository<Tx> {
    async fn get(&self, tx: &mut Tx, id: WalletId) -> WalletResult<Option<Wallet>>;

    /// Insert a new wallet. Fails with `WalletAlreadyExists` on a duplicate ID.
    async fn add(&self, tx: &mut Tx, wallet: &Wallet) -> WalletResult<()>;

    /// Persist the balance. Fails with `WalletNotFound` for an unknown wallet.
    async fn update(&self, tx: &mut Tx, wallet: &Wallet) -> WalletResult<()>;

    async fn exists_for_owner(
        &self,
        tx: &mut Tx,
        owner_id: CustomerId,
        currency: &Currency,
    ) -> WalletResult<bool>;
}
