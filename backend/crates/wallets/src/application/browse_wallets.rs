//! Browse Wallets Query

use kernel::pagination::{PageRequest, Paged, PagedQuery};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::Wallet;
use crate::error::WalletResult;

/// Paged wallet listing, optionally filtered by owner and currency.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseWallets {
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub paging: PagedQuery,
}

impl BrowseWallets {
    /// Whether `wallet` passes the owner and currency filters.
    pub fn matches(&self, wallet: &Wallet) -> bool {
        let owner = self
            .owner_id
            .is_none_or(|owner_id| *wallet.owner_id().as_uuid() == owner_id);
        let currency = self
            .currency
            .as_deref()
            .is_none_or(|code| wallet.currency().as_str().eq_ignore_ascii_case(code.trim()));
        owner && currency
    }
}

impl PageRequest for BrowseWallets {
    fn page(&self) -> i64 {
        self.paging.page
    }

    fn results(&self) -> i64 {
        self.paging.results
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDto {
    pub wallet_id: Uuid,
    pub owner_id: Uuid,
    pub currency: String,
    pub balance: i64,
}

impl From<&Wallet> for WalletDto {
    fn from(wallet: &Wallet) -> Self {
        Self {
            wallet_id: wallet.id().into_uuid(),
            owner_id: wallet.owner_id().into_uuid(),
            currency: wallet.currency().to_string(),
            balance: wallet.balance(),
        }
    }
}

/// Read side of the Wallets module
#[trait_variant::make(WalletReadModel: Send)]
pub trait LocalWalletReadModel {
    async fn browse(&self, query: BrowseWallets) -> WalletResult<Paged<WalletDto>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Currency;
    use kernel::id::CustomerId;

    #[test]
    fn test_query_deserializes_with_defaults() {
        let query: BrowseWallets = serde_json::from_str(r#"{"currency":"eur"}"#).unwrap();
        assert_eq!(query.currency.as_deref(), Some("eur"));
        assert_eq!(query.owner_id, None);
        assert_eq!(query.page(), 1);
        assert_eq!(query.results(), 10);

        let query: BrowseWallets = serde_json::from_str(r#"{"page":3,"results":25}"#).unwrap();
        assert_eq!((query.page(), query.results()), (3, 25));
    }

    #[test]
    fn test_filters() {
        let owner = CustomerId::new();
        let wallet = Wallet::open(owner, Currency::parse("EUR").unwrap());

        assert!(BrowseWallets::default().matches(&wallet));
        assert!(
            BrowseWallets {
                owner_id: Some(owner.into_uuid()),
                currency: Some("eur".to_string()),
                ..Default::default()
            }
            .matches(&wallet)
        );
        assert!(
            !BrowseWallets {
                currency: Some("PLN".to_string()),
                ..Default::default()
            }
            .matches(&wallet)
        );
        assert!(
            !BrowseWallets {
                owner_id: Some(Uuid::new_v4()),
                ..Default::default()
            }
            .matches(&wallet)
        );
    }

    #[test]
    fn test_dto_serialization() {
        let wallet = Wallet::open(CustomerId::new(), Currency::parse("PLN").unwrap());
        let json = serde_json::to_value(WalletDto::from(&wallet)).unwrap();
        assert_eq!(json["currency"], "PLN");
        assert_eq!(json["balance"], 0);
        assert!(json.get("walletId").is_some());
        assert!(json.get("ownerId").is_some());
    }
}
