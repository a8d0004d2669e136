//! Customers Backend Module
//!
//! Customer onboarding. Completing a customer is what opens their wallets.
//!
//! Owns the `customers` schema. Its unit of work is registered at startup so
//! that any handler decorated for [`MODULE`] runs inside a transaction
//! of this schema.

use std::sync::Arc;

use platform::transaction::{ModuleKey, PgStorage, RegistryError, UnitOfWorkRegistryBuilder};
use sqlx::PgPool;

pub const MODULE: ModuleKey = ModuleKey::new("customers");

/// PostgreSQL schema owned by this module.
pub const SCHEMA: &str = "customers";

/// Register the Customers unit of work over the shared pool.
pub fn register_unit_of_work(
    builder: &mut UnitOfWorkRegistryBuilder<PgStorage>,
    pool: PgPool,
) -> Result<(), RegistryError> {
    builder.register_storage(MODULE, Arc::new(PgStorage::new(pool, SCHEMA)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/inflow")
            .unwrap()
    }

    #[tokio::test]
    async fn test_registers_unit_of_work_for_schema() {
        let mut builder = UnitOfWorkRegistryBuilder::new();
        register_unit_of_work(&mut builder, lazy_pool()).unwrap();
        let registry = builder.freeze();

        let unit_of_work = registry.resolve(MODULE).unwrap()();
        assert_eq!(unit_of_work.module(), MODULE);
        assert_eq!(unit_of_work.storage().schema(), "customers");
    }

    #[tokio::test]
    async fn test_second_registration_fails() {
        let mut builder = UnitOfWorkRegistryBuilder::new();
        register_unit_of_work(&mut builder, lazy_pool()).unwrap();

        let err = register_unit_of_work(&mut builder, lazy_pool()).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered(MODULE));
    }
}
