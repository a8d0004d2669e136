//! Payments Backend Module
//!
//! Deposits and withdrawals against external payment providers.
//!
//! Owns the `payments` schema. Its unit of work is registered at startup so
//! that any handler decorated for [`MODULE`] runs inside a transaction
//! of this schema.

use std::sync::Arc;

use platform::transaction::{ModuleKey, PgStorage, RegistryError, UnitOfWorkRegistryBuilder};
use sqlx::PgPool;

pub const MODULE: ModuleKey = ModuleKey::new("payments");

/// PostgreSQL schema owned by this module.
pub const SCHEMA: &str = "payments";

/// Register the Payments unit of work over the shared pool.
pub fn register_unit_of_work(
    builder: &mut UnitOfWorkRegistryBuilder<PgStorage>,
    pool: PgPool,
) -> Result<(), RegistryError> {
    builder.register_storage(MODULE, Arc::new(PgStorage::new(pool, SCHEMA)))
}
