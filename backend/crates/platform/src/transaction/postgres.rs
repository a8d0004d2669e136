//! PostgreSQL storage context
//!
//! Modules share one connection pool but each owns a schema. Every
//! transaction opened through a module's [`PgStorage`] has its
//! `search_path` pinned to that schema for the duration of the transaction.

use sqlx::{PgConnection, PgPool, Postgres};

use super::error::StorageError;
use super::storage::{StorageContext, Transaction};

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
    schema: &'static str,
}

impl PgStorage {
    pub fn new(pool: PgPool, schema: &'static str) -> Self {
        Self { pool, schema }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &'static str {
        self.schema
    }
}

impl StorageContext for PgStorage {
    type Transaction = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, StorageError> {
        let mut inner = self.pool.begin().await?;

        // SET does not accept bind parameters; the schema is a module constant.
        let statement = format!("SET LOCAL search_path TO \"{}\"", self.schema.replace('"', "\"\""));
        sqlx::query(&statement).execute(&mut *inner).await?;

        Ok(PgTransaction { inner })
    }
}

/// Open PostgreSQL transaction. Dropped without commit, it rolls back.
pub struct PgTransaction {
    inner: sqlx::Transaction<'static, Postgres>,
}

impl PgTransaction {
    /// Connection to run statements on inside this transaction.
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.inner
    }
}

impl Transaction for PgTransaction {
    async fn commit(self) -> Result<(), StorageError> {
        self.inner.commit().await.map_err(StorageError::from)
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.inner.rollback().await.map_err(StorageError::from)
    }
}
