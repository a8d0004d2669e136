//! In-memory Implementations
//!
//! Back the Wallets module with a [`MemoryStorage<WalletBook>`], e.g. in
//! tests or when running without a database.

use std::sync::Arc;

use kernel::id::{CustomerId, WalletId};
use kernel::pagination::{Paged, PageRequest, paginate};
use platform::transaction::{MemoryStorage, MemoryTransaction};

use crate::application::browse_wallets::{BrowseWallets, WalletDto, WalletReadModel};
use crate::domain::entities::Wallet;
use crate::domain::repository::WalletRepository;
use crate::domain::value_objects::Currency;
use crate::error::{WalletError, WalletResult};

/// All wallets, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct WalletBook {
    wallets: Vec<Wallet>,
}

impl WalletBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_wallets(wallets: Vec<Wallet>) -> Self {
        Self { wallets }
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn find(&self, id: WalletId) -> Option<&Wallet> {
        self.wallets.iter().find(|wallet| wallet.id() == id)
    }

    fn find_mut(&mut self, id: WalletId) -> Option<&mut Wallet> {
        self.wallets.iter_mut().find(|wallet| wallet.id() == id)
    }
}

pub type MemoryWalletTransaction = MemoryTransaction<WalletBook>;

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryWalletRepository;

impl MemoryWalletRepository {
    pub fn new() -> Self {
        Self
    }
}

impl WalletRepository<MemoryWalletTransaction> for MemoryWalletRepository {
    async fn get(
        &self,
        tx: &mut MemoryWalletTransaction,
        id: WalletId,
    ) -> WalletResult<Option<Wallet>> {
        Ok(tx.state().find(id).cloned())
    }

    async fn add(&self, tx: &mut MemoryWalletTransaction, wallet: &Wallet) -> WalletResult<()> {
        let book = tx.state();
        if book.find(wallet.id()).is_some() {
            return Err(WalletError::WalletAlreadyExists(wallet.id()));
        }
        if book.wallets.iter().any(|existing| {
            existing.owner_id() == wallet.owner_id() && existing.currency() == wallet.currency()
        }) {
            return Err(WalletError::OwnerAlreadyHasWallet {
                owner_id: wallet.owner_id(),
                currency: wallet.currency().to_string(),
            });
        }
        tx.state_mut().wallets.push(wallet.clone());
        Ok(())
    }

    async fn update(&self, tx: &mut MemoryWalletTransaction, wallet: &Wallet) -> WalletResult<()> {
        let stored = tx
            .state_mut()
            .find_mut(wallet.id())
            .ok_or(WalletError::WalletNotFound(wallet.id()))?;
        *stored = wallet.clone();
        Ok(())
    }

    async fn exists_for_owner(
        &self,
        tx: &mut MemoryWalletTransaction,
        owner_id: CustomerId,
        currency: &Currency,
    ) -> WalletResult<bool> {
        Ok(tx
            .state()
            .wallets
            .iter()
            .any(|wallet| wallet.owner_id() == owner_id && wallet.currency() == currency))
    }
}

/// Read model over the committed state of a [`MemoryStorage<WalletBook>`]
#[derive(Clone)]
pub struct MemoryWalletReadModel {
    storage: Arc<MemoryStorage<WalletBook>>,
}

impl MemoryWalletReadModel {
    pub fn new(storage: Arc<MemoryStorage<WalletBook>>) -> Self {
        Self { storage }
    }
}

impl WalletReadModel for MemoryWalletReadModel {
    async fn browse(&self, query: BrowseWallets) -> WalletResult<Paged<WalletDto>> {
        let book = self.storage.snapshot().await;
        let matching: Vec<&Wallet> = book
            .wallets()
            .iter()
            .filter(|wallet| query.matches(wallet))
            .collect();

        Ok(paginate(matching, query.page(), query.results()).map(WalletDto::from))
    }
}
