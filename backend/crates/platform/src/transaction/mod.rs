//! Transactional execution layer
//!
//! - `storage` - what a module's persistence must offer (begin/commit/rollback)
//! - `unit_of_work` - run one action inside one transaction
//! - `registry` - module key → unit-of-work factory, frozen after startup
//! - `decorator` - transactional wrappers for command and event handlers
//! - `postgres`, `memory` - storage context implementations

pub mod decorator;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod registry;
pub mod storage;
pub mod unit_of_work;

pub use decorator::{
    CommandHandler, EventDispatchError, EventHandler, EventHandlers, HandlerFailure,
    TransactionalCommandHandler, TransactionalEventHandler,
};
pub use error::{RegistryError, StorageError, TransactionError};
pub use memory::{MemoryStorage, MemoryTransaction};
pub use postgres::{PgStorage, PgTransaction};
pub use registry::{ModuleKey, UnitOfWorkFactory, UnitOfWorkRegistry, UnitOfWorkRegistryBuilder};
pub use storage::{StorageContext, Transaction};
pub use unit_of_work::UnitOfWork;
