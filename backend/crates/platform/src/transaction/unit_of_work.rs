//! Unit of Work
//!
//! Runs an action inside exactly one transaction on a module's storage
//! context: begin, run, then commit on success or roll back on failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::error::{StorageError, TransactionError};
use super::registry::ModuleKey;
use super::storage::{StorageContext, Transaction};

/// Atomic-execution wrapper around one storage context.
///
/// One instance serves one logical operation. While its transaction is open,
/// further calls to [`execute`](Self::execute) on the same instance fail
/// with [`TransactionError::NestedTransaction`].
pub struct UnitOfWork<S> {
    module: ModuleKey,
    storage: Arc<S>,
    active: AtomicBool,
}

impl<S> UnitOfWork<S>
where
    S: StorageContext,
{
    pub fn new(module: ModuleKey, storage: Arc<S>) -> Self {
        Self {
            module,
            storage,
            active: AtomicBool::new(false),
        }
    }

    pub fn module(&self) -> ModuleKey {
        self.module
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Run `action` inside a transaction.
    ///
    /// The action receives the open transaction and must do all of its
    /// writes through it.
    ///
    /// ## Examples
    /// ```rust
    /// use std::sync::Arc;
    /// use platform::transaction::{MemoryStorage, ModuleKey, UnitOfWork};
    ///
    /// # tokio_test::block_on(async {
    /// let storage = Arc::new(MemoryStorage::new(0_i64));
    /// let uow = UnitOfWork::new(ModuleKey::new("wallets"), Arc::clone(&storage));
    ///
    /// uow.execute(|tx| {
    ///     Box::pin(async move {
    ///         *tx.state_mut() += 100;
    ///         Ok::<_, std::io::Error>(())
    ///     })
    /// })
    /// .await
    /// .unwrap();
    ///
    /// assert_eq!(storage.snapshot().await, 100);
    /// # });
    /// ```
    pub async fn execute<F, T, E>(&self, action: F) -> Result<T, TransactionError<E>>
    where
        F: for<'t> FnOnce(&'t mut S::Transaction) -> BoxFuture<'t, Result<T, E>> + Send,
        T: Send,
        E: Send,
    {
        self.run(action, None).await
    }

    /// [`execute`](Self::execute), abandoned when `cancellation` fires.
    ///
    /// Cancellation before the transaction begins skips it entirely;
    /// cancellation while the action runs drops the action and rolls back.
    pub async fn execute_with_cancellation<F, T, E>(
        &self,
        cancellation: &CancellationToken,
        action: F,
    ) -> Result<T, TransactionError<E>>
    where
        F: for<'t> FnOnce(&'t mut S::Transaction) -> BoxFuture<'t, Result<T, E>> + Send,
        T: Send,
        E: Send,
    {
        self.run(action, Some(cancellation)).await
    }

    async fn run<F, T, E>(
        &self,
        action: F,
        cancellation: Option<&CancellationToken>,
    ) -> Result<T, TransactionError<E>>
    where
        F: for<'t> FnOnce(&'t mut S::Transaction) -> BoxFuture<'t, Result<T, E>> + Send,
        T: Send,
        E: Send,
    {
        let _guard = ActiveGuard::enter(&self.active).ok_or_else(|| {
            tracing::error!(module = %self.module, "Nested unit of work execution rejected");
            TransactionError::NestedTransaction
        })?;

        // Waiting for a connection or lock is abandoned as well.
        let begun = match cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => None,
                begun = self.storage.begin() => Some(begun),
            },
            None => Some(self.storage.begin().await),
        };
        let Some(begun) = begun else {
            tracing::debug!(module = %self.module, "Cancelled before transaction began");
            return Err(TransactionError::Cancelled { rollback: None });
        };

        let mut tx = begun.map_err(|e| {
            tracing::error!(module = %self.module, error = %e, "Failed to begin transaction");
            TransactionError::Begin(e)
        })?;
        tracing::debug!(module = %self.module, "Transaction started");

        let outcome = match cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => None,
                outcome = action(&mut tx) => Some(outcome),
            },
            None => Some(action(&mut tx).await),
        };

        match outcome {
            Some(Ok(value)) => {
                tx.commit().await.map_err(|e| {
                    tracing::error!(module = %self.module, error = %e, "Failed to commit transaction");
                    TransactionError::Commit(e)
                })?;
                tracing::debug!(module = %self.module, "Transaction committed");
                Ok(value)
            }
            Some(Err(handler)) => match self.rollback(tx).await {
                Ok(()) => Err(TransactionError::Handler(handler)),
                Err(rollback) => Err(TransactionError::Rollback { handler, rollback }),
            },
            None => {
                tracing::warn!(module = %self.module, "Operation cancelled inside transaction");
                let rollback = self.rollback(tx).await.err();
                Err(TransactionError::Cancelled { rollback })
            }
        }
    }

    async fn rollback(&self, tx: S::Transaction) -> Result<(), StorageError> {
        match tx.rollback().await {
            Ok(()) => {
                tracing::warn!(module = %self.module, "Transaction rolled back");
                Ok(())
            }
            Err(e) => {
                tracing::error!(module = %self.module, error = %e, "Failed to roll back transaction");
                Err(e)
            }
        }
    }
}

/// Marks a unit of work busy for the lifetime of one `execute` call,
/// including when the call is dropped midway.
struct ActiveGuard<'a>(&'a AtomicBool);

impl<'a> ActiveGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
