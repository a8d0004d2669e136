//! PostgreSQL Repository Implementations
//!
//! Writes run on the [`PgTransaction`] opened by the Wallets unit of work,
//! whose `search_path` is already the `wallets` schema. Reads go straight
//! to the pool and therefore qualify the table name.

use kernel::id::{CustomerId, WalletId};
use kernel::pagination::{PageRequest, Paged};
use platform::transaction::PgTransaction;
use sqlx::PgPool;
use uuid::Uuid;

use crate::application::browse_wallets::{BrowseWallets, WalletDto, WalletReadModel};
use crate::domain::entities::Wallet;
use crate::domain::repository::WalletRepository;
use crate::domain::value_objects::Currency;
use crate::error::{WalletError, WalletResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct PgWalletRepository;

impl PgWalletRepository {
    pub fn new() -> Self {
        Self
    }
}

impl WalletRepository<PgTransaction> for PgWalletRepository {
    async fn get(&self, tx: &mut PgTransaction, id: WalletId) -> WalletResult<Option<Wallet>> {
        // Row lock: concurrent debits of one wallet serialize here.
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT wallet_id, owner_id, currency, balance
            FROM wallets
            WHERE wallet_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.into_uuid())
        .fetch_optional(tx.connection())
        .await?;

        row.map(WalletRow::into_wallet).transpose()
    }

    async fn add(&self, tx: &mut PgTransaction, wallet: &Wallet) -> WalletResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO wallets (wallet_id, owner_id, currency, balance)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (owner_id, currency) DO NOTHING
            "#,
        )
        .bind(wallet.id().into_uuid())
        .bind(wallet.owner_id().into_uuid())
        .bind(wallet.currency().as_str())
        .bind(wallet.balance())
        .execute(tx.connection())
        .await
        .map_err(|e| {
            let duplicate_id =
                e.as_database_error().and_then(|db| db.constraint()) == Some("wallets_pkey");
            if duplicate_id {
                WalletError::WalletAlreadyExists(wallet.id())
            } else {
                WalletError::from(e)
            }
        })?
        .rows_affected();

        // A concurrent transaction opened the same owner's wallet first.
        if inserted == 0 {
            return Err(WalletError::OwnerAlreadyHasWallet {
                owner_id: wallet.owner_id(),
                currency: wallet.currency().to_string(),
            });
        }
        Ok(())
    }

    async fn update(&self, tx: &mut PgTransaction, wallet: &Wallet) -> WalletResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = $2, updated_at = now()
            WHERE wallet_id = $1
            "#,
        )
        .bind(wallet.id().into_uuid())
        .bind(wallet.balance())
        .execute(tx.connection())
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(WalletError::WalletNotFound(wallet.id()));
        }
        Ok(())
    }

    async fn exists_for_owner(
        &self,
        tx: &mut PgTransaction,
        owner_id: CustomerId,
        currency: &Currency,
    ) -> WalletResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM wallets WHERE owner_id = $1 AND currency = $2)",
        )
        .bind(owner_id.into_uuid())
        .bind(currency.as_str())
        .fetch_one(tx.connection())
        .await?;

        Ok(exists)
    }
}

/// Read model over the shared pool
#[derive(Clone)]
pub struct PgWalletReadModel {
    pool: PgPool,
}

impl PgWalletReadModel {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl WalletReadModel for PgWalletReadModel {
    async fn browse(&self, query: BrowseWallets) -> WalletResult<Paged<WalletDto>> {
        let window = query.window();
        let currency = query
            .currency
            .as_deref()
            .map(|code| code.trim().to_ascii_uppercase());

        let total_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM wallets.wallets
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR currency = $2)
            "#,
        )
        .bind(query.owner_id)
        .bind(currency.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT wallet_id, owner_id, currency, balance
            FROM wallets.wallets
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR currency = $2)
            ORDER BY created_at, wallet_id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.owner_id)
        .bind(currency.as_deref())
        .bind(i64::try_from(window.limit()).unwrap_or(i64::MAX))
        .bind(i64::try_from(window.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|row| row.into_wallet().map(|wallet| WalletDto::from(&wallet)))
            .collect::<WalletResult<Vec<_>>>()?;

        Ok(Paged::from_window(
            items,
            window,
            u64::try_from(total_count).unwrap_or_default(),
        ))
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct WalletRow {
    wallet_id: Uuid,
    owner_id: Uuid,
    currency: String,
    balance: i64,
}

impl WalletRow {
    fn into_wallet(self) -> WalletResult<Wallet> {
        Ok(Wallet::restore(
            WalletId::from_uuid(self.wallet_id),
            CustomerId::from_uuid(self.owner_id),
            Currency::parse(&self.currency)?,
            self.balance,
        ))
    }
}
