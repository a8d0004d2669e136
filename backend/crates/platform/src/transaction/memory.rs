//! In-memory storage context
//!
//! Holds a single state value. A transaction takes the state lock for its
//! whole lifetime, works on a staged copy and publishes it on commit, so
//! transactions on the same storage are serialized and a dropped transaction
//! leaves no trace. Separate storages never block each other.
//!
//! Every begin/commit/rollback is counted in a [`Journal`], and [`Faults`]
//! can make any of them fail on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::StorageError;
use super::storage::{StorageContext, Transaction};

pub struct MemoryStorage<T> {
    state: Arc<Mutex<T>>,
    journal: Arc<Journal>,
    faults: Arc<Faults>,
}

impl<T> MemoryStorage<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
            journal: Arc::default(),
            faults: Arc::default(),
        }
    }

    /// Committed state. Waits for an open transaction to finish.
    pub async fn snapshot(&self) -> T {
        self.state.lock().await.clone()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

impl<T> StorageContext for MemoryStorage<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Transaction = MemoryTransaction<T>;

    async fn begin(&self) -> Result<MemoryTransaction<T>, StorageError> {
        if self.faults.begin.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("begin failed".into()));
        }

        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = (*guard).clone();
        self.journal.begins.fetch_add(1, Ordering::SeqCst);

        Ok(MemoryTransaction {
            guard,
            staged,
            journal: Arc::clone(&self.journal),
            faults: Arc::clone(&self.faults),
        })
    }
}

/// Open transaction on a [`MemoryStorage`].
pub struct MemoryTransaction<T> {
    guard: OwnedMutexGuard<T>,
    staged: T,
    journal: Arc<Journal>,
    faults: Arc<Faults>,
}

impl<T> MemoryTransaction<T> {
    /// State as seen inside this transaction.
    pub fn state(&self) -> &T {
        &self.staged
    }

    pub fn state_mut(&mut self) -> &mut T {
        &mut self.staged
    }
}

impl<T> Transaction for MemoryTransaction<T>
where
    T: Send + Sync + 'static,
{
    async fn commit(self) -> Result<(), StorageError> {
        if self.faults.commit.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("commit failed".into()));
        }

        let MemoryTransaction {
            mut guard,
            staged,
            journal,
            ..
        } = self;
        *guard = staged;
        journal.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        if self.faults.rollback.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("rollback failed".into()));
        }

        self.journal.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Transaction counters
#[derive(Debug, Default)]
pub struct Journal {
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl Journal {
    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

/// Failure injection switches
#[derive(Debug, Default)]
pub struct Faults {
    begin: AtomicBool,
    commit: AtomicBool,
    rollback: AtomicBool,
}

impl Faults {
    pub fn fail_begin(&self, fail: bool) {
        self.begin.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commit(&self, fail: bool) {
        self.commit.store(fail, Ordering::SeqCst);
    }

    pub fn fail_rollback(&self, fail: bool) {
        self.rollback.store(fail, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_commit_publishes_staged_state() {
        let storage = MemoryStorage::new(vec![1]);
        let mut tx = storage.begin().await.unwrap();
        tx.state_mut().push(2);
        assert_eq!(tx.state(), &vec![1, 2]);
        tx.commit().await.unwrap();

        assert_eq!(storage.snapshot().await, vec![1, 2]);
        assert_eq!(storage.journal().commits(), 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_staged_state() {
        let storage = MemoryStorage::new(1);

        let mut tx = storage.begin().await.unwrap();
        *tx.state_mut() = 2;
        tx.rollback().await.unwrap();

        let mut tx = storage.begin().await.unwrap();
        *tx.state_mut() = 3;
        drop(tx);

        assert_eq!(storage.snapshot().await, 1);
        assert_eq!(storage.journal().begins(), 2);
        assert_eq!(storage.journal().rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_transactions_on_one_storage_are_serialized() {
        let storage = Arc::new(MemoryStorage::new(0));
        let tx = storage.begin().await.unwrap();

        let second = {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move { storage.begin().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        tx.commit().await.unwrap();
        second.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let storage = MemoryStorage::new(0);

        storage.faults().fail_begin(true);
        assert!(storage.begin().await.is_err());
        storage.faults().fail_begin(false);

        storage.faults().fail_commit(true);
        let mut tx = storage.begin().await.unwrap();
        *tx.state_mut() = 5;
        assert!(tx.commit().await.is_err());
        assert_eq!(storage.snapshot().await, 0);

        storage.faults().fail_rollback(true);
        let tx = storage.begin().await.unwrap();
        assert!(tx.rollback().await.is_err());
        assert_eq!(storage.journal().rollbacks(), 0);
    }
}
