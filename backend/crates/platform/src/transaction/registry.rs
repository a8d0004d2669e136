//! Unit-of-Work Registry
//!
//! Maps a module key to the factory building that module's unit of work.
//! Shared code (the transactional decorators) only ever sees the key, never
//! the module's storage type.
//!
//! Populated during startup through [`UnitOfWorkRegistryBuilder`], then
//! frozen into an immutable [`UnitOfWorkRegistry`]. Freezing consumes the
//! builder, so nothing can register once traffic is being served.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::RegistryError;
use super::storage::StorageContext;
use super::unit_of_work::UnitOfWork;

/// Identifies a module (bounded context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey(&'static str);

impl ModuleKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Builds a fresh unit of work for one logical operation.
pub type UnitOfWorkFactory<S> = Arc<dyn Fn() -> UnitOfWork<S> + Send + Sync>;

/// Mutable registration phase.
pub struct UnitOfWorkRegistryBuilder<S> {
    factories: HashMap<ModuleKey, UnitOfWorkFactory<S>>,
}

impl<S> Default for UnitOfWorkRegistryBuilder<S> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<S> UnitOfWorkRegistryBuilder<S>
where
    S: StorageContext + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `module`.
    ///
    /// Registering the same module twice is a configuration error; the first
    /// registration is kept.
    pub fn register<F>(&mut self, module: ModuleKey, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> UnitOfWork<S> + Send + Sync + 'static,
    {
        if self.factories.contains_key(&module) {
            tracing::error!(module = %module, "Duplicate unit of work registration");
            return Err(RegistryError::AlreadyRegistered(module));
        }

        self.factories.insert(module, Arc::new(factory));
        tracing::debug!(module = %module, "Unit of work registered");
        Ok(())
    }

    /// Register a unit of work bound to `storage`.
    pub fn register_storage(
        &mut self,
        module: ModuleKey,
        storage: Arc<S>,
    ) -> Result<(), RegistryError> {
        self.register(module, move || UnitOfWork::new(module, Arc::clone(&storage)))
    }

    /// End the registration phase.
    pub fn freeze(self) -> UnitOfWorkRegistry<S> {
        let registry = UnitOfWorkRegistry {
            factories: Arc::new(self.factories),
        };
        tracing::info!(modules = ?registry.modules(), "Unit of work registry frozen");
        registry
    }
}

/// Read-only registry. Cloning is cheap and lookups take no lock.
pub struct UnitOfWorkRegistry<S> {
    factories: Arc<HashMap<ModuleKey, UnitOfWorkFactory<S>>>,
}

impl<S> Clone for UnitOfWorkRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            factories: Arc::clone(&self.factories),
        }
    }
}

impl<S> UnitOfWorkRegistry<S> {
    /// Factory registered for `module`.
    pub fn resolve(&self, module: ModuleKey) -> Result<UnitOfWorkFactory<S>, RegistryError> {
        self.factories
            .get(&module)
            .cloned()
            .ok_or(RegistryError::NotRegistered(module))
    }

    pub fn contains(&self, module: ModuleKey) -> bool {
        self.factories.contains_key(&module)
    }

    /// Registered modules, sorted by key.
    pub fn modules(&self) -> Vec<ModuleKey> {
        let mut modules: Vec<_> = self.factories.keys().copied().collect();
        modules.sort();
        modules
    }
}

impl<S> fmt::Debug for UnitOfWorkRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWorkRegistry")
            .field("modules", &self.modules())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::memory::MemoryStorage;

    const CUSTOMERS: ModuleKey = ModuleKey::new("customers");
    const WALLETS: ModuleKey = ModuleKey::new("wallets");

    #[test]
    fn test_resolve_returns_the_registered_factory() {
        let mut builder = UnitOfWorkRegistryBuilder::new();
        let customers = Arc::new(MemoryStorage::new(0_u32));
        let wallets = Arc::new(MemoryStorage::new(0_u32));
        builder
            .register_storage(CUSTOMERS, Arc::clone(&customers))
            .unwrap();
        builder.register_storage(WALLETS, Arc::clone(&wallets)).unwrap();
        let registry = builder.freeze();

        let uow = registry.resolve(WALLETS).unwrap()();
        assert_eq!(uow.module(), WALLETS);
        assert!(Arc::ptr_eq(uow.storage(), &wallets));

        let uow = registry.resolve(CUSTOMERS).unwrap()();
        assert!(Arc::ptr_eq(uow.storage(), &customers));
    }

    #[test]
    fn test_resolve_returns_same_factory_instance() {
        let mut builder = UnitOfWorkRegistryBuilder::new();
        builder
            .register_storage(WALLETS, Arc::new(MemoryStorage::new(())))
            .unwrap();
        let registry = builder.freeze();

        let first = registry.resolve(WALLETS).unwrap();
        let second = registry.clone().resolve(WALLETS).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let first = Arc::new(MemoryStorage::new(1_u8));
        let mut builder = UnitOfWorkRegistryBuilder::new();
        builder.register_storage(WALLETS, Arc::clone(&first)).unwrap();

        let err = builder
            .register_storage(WALLETS, Arc::new(MemoryStorage::new(2_u8)))
            .unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered(WALLETS));

        // The original registration survives.
        let registry = builder.freeze();
        assert!(Arc::ptr_eq(registry.resolve(WALLETS).unwrap()().storage(), &first));
    }

    #[test]
    fn test_unregistered_module() {
        let registry = UnitOfWorkRegistryBuilder::<MemoryStorage<()>>::new().freeze();
        let err = registry.resolve(CUSTOMERS).err().unwrap();
        assert_eq!(err, RegistryError::NotRegistered(CUSTOMERS));
        assert!(!registry.contains(CUSTOMERS));
    }

    #[test]
    fn test_modules_are_sorted() {
        let mut builder = UnitOfWorkRegistryBuilder::new();
        for key in [WALLETS, ModuleKey::new("users"), CUSTOMERS] {
            builder.register_storage(key, Arc::new(MemoryStorage::new(()))).unwrap();
        }
        let registry = builder.freeze();
        assert_eq!(
            registry.modules(),
            vec![CUSTOMERS, ModuleKey::new("users"), WALLETS]
        );
    }
}
