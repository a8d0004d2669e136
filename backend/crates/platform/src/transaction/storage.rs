//! Storage Context Traits
//!
//! A storage context is a module's handle on its own persistence. The
//! transaction layer only needs to open, commit and roll back transactions
//! on it; everything else (queries, mapping) stays inside the module.

use super::error::StorageError;

/// An open transaction.
///
/// Implementations must discard uncommitted writes when dropped, so that a
/// cancelled or panicking operation never leaves a transaction open.
#[trait_variant::make(Transaction: Send)]
pub trait LocalTransaction {
    async fn commit(self) -> Result<(), StorageError>;

    async fn rollback(self) -> Result<(), StorageError>;
}

/// A per-module persistence handle able to start transactions.
#[trait_variant::make(StorageContext: Send)]
pub trait LocalStorageContext {
    type Transaction: Transaction;

    async fn begin(&self) -> Result<Self::Transaction, StorageError>;
}
