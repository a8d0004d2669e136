//! Wallet Error Types
//!
//! Wallet-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::id::{CustomerId, WalletId};
use thiserror::Error;

/// Wallet-specific result type alias
pub type WalletResult<T> = Result<T, WalletError>;

#[derive(Debug, Error)]
pub enum WalletError {
    /// Zero or negative amount
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Debit larger than the balance
    #[error("Insufficient funds in wallet {wallet_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        wallet_id: WalletId,
        balance: i64,
        requested: i64,
    },

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("Wallet already exists: {0}")]
    WalletAlreadyExists(WalletId),

    /// One wallet per owner and currency
    #[error("Customer {owner_id} already has a {currency} wallet")]
    OwnerAlreadyHasWallet { owner_id: CustomerId, currency: String },

    /// Balance would overflow
    #[error("Balance overflow in wallet {0}")]
    BalanceOverflow(WalletId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl WalletError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::InvalidAmount(_) | WalletError::InvalidCurrency(_) => {
                ErrorKind::BadRequest
            }
            WalletError::InsufficientFunds { .. } | WalletError::BalanceOverflow(_) => {
                ErrorKind::UnprocessableEntity
            }
            WalletError::WalletNotFound(_) => ErrorKind::NotFound,
            WalletError::WalletAlreadyExists(_) | WalletError::OwnerAlreadyHasWallet { .. } => {
                ErrorKind::Conflict
            }
            WalletError::Database(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            WalletError::Database(e) => {
                tracing::error!(error = %e, "Wallet database error");
            }
            WalletError::InsufficientFunds {
                wallet_id,
                balance,
                requested,
            } => {
                tracing::warn!(
                    wallet_id = %wallet_id,
                    balance,
                    requested,
                    "Wallet debit rejected"
                );
            }
            _ => {
                tracing::debug!(error = %self, "Wallet error");
            }
        }
    }
}

impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        err.log();
        match err {
            // Keep the database classification (conflict, unavailable, ...).
            WalletError::Database(e) => AppError::from(e),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let wallet_id = WalletId::new();
        assert_eq!(WalletError::InvalidAmount(0).kind(), ErrorKind::BadRequest);
        assert_eq!(
            WalletError::InsufficientFunds {
                wallet_id,
                balance: 5,
                requested: 10
            }
            .kind(),
            ErrorKind::UnprocessableEntity
        );
        assert_eq!(WalletError::WalletNotFound(wallet_id).kind(), ErrorKind::NotFound);
        assert_eq!(
            WalletError::WalletAlreadyExists(wallet_id).kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = WalletError::InvalidCurrency("XX".to_string()).into();
        assert_eq!(app.kind(), ErrorKind::BadRequest);
        assert_eq!(app.message(), "Invalid currency: XX");

        let app: AppError = WalletError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(app.kind(), ErrorKind::NotFound);
    }
}
