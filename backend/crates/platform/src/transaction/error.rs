//! Transaction Error Types
//!
//! Configuration errors ([`RegistryError`]), storage failures
//! ([`StorageError`]) and the outcome of a failed unit of work
//! ([`TransactionError`]). All of them convert into `kernel::AppError`.

use std::error::Error;
use std::fmt;

use kernel::error::app_error::AppError;
use thiserror::Error;

use super::registry::ModuleKey;

/// Failure reported by a storage context or one of its transactions.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage could not be reached (connection refused, injected fault, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Misconfigured unit-of-work registration.
///
/// Both variants are startup defects and must abort startup rather than
/// fall back to another module's storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unit of work for module '{0}' is already registered")]
    AlreadyRegistered(ModuleKey),

    #[error("No unit of work registered for module '{0}'")]
    NotRegistered(ModuleKey),
}

/// Why a unit of work did not complete.
///
/// `E` is the wrapped handler's own error type. It is carried untouched:
/// a handler failure comes back as [`TransactionError::Handler`] holding the
/// exact value the handler returned.
pub enum TransactionError<E> {
    /// `execute` was called on a unit of work whose transaction is still open
    NestedTransaction,
    /// The transaction could not be opened; the handler never ran
    Begin(StorageError),
    /// The handler failed and the transaction was rolled back
    Handler(E),
    /// The handler succeeded but the commit failed
    Commit(StorageError),
    /// The handler failed and the rollback failed as well
    Rollback { handler: E, rollback: StorageError },
    /// The caller cancelled the operation; `rollback` holds a rollback
    /// failure if there was one
    Cancelled { rollback: Option<StorageError> },
}

impl<E> TransactionError<E> {
    /// The handler's error, if the handler is what failed.
    pub fn handler_error(&self) -> Option<&E> {
        match self {
            TransactionError::Handler(e) | TransactionError::Rollback { handler: e, .. } => Some(e),
            _ => None,
        }
    }

    pub fn into_handler_error(self) -> Option<E> {
        match self {
            TransactionError::Handler(e) | TransactionError::Rollback { handler: e, .. } => Some(e),
            _ => None,
        }
    }

    /// `true` when the transaction may have been left in an unknown state
    /// (commit or rollback failed).
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            TransactionError::Begin(_)
                | TransactionError::Commit(_)
                | TransactionError::Rollback { .. }
                | TransactionError::Cancelled { rollback: Some(_) }
        )
    }

    /// Convert the handler error, leaving every other variant as is.
    pub fn map_handler<F, U>(self, f: F) -> TransactionError<U>
    where
        F: FnOnce(E) -> U,
    {
        match self {
            TransactionError::NestedTransaction => TransactionError::NestedTransaction,
            TransactionError::Begin(e) => TransactionError::Begin(e),
            TransactionError::Handler(e) => TransactionError::Handler(f(e)),
            TransactionError::Commit(e) => TransactionError::Commit(e),
            TransactionError::Rollback { handler, rollback } => TransactionError::Rollback {
                handler: f(handler),
                rollback,
            },
            TransactionError::Cancelled { rollback } => TransactionError::Cancelled { rollback },
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for TransactionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::NestedTransaction => f.write_str("NestedTransaction"),
            TransactionError::Begin(e) => f.debug_tuple("Begin").field(e).finish(),
            TransactionError::Handler(e) => f.debug_tuple("Handler").field(e).finish(),
            TransactionError::Commit(e) => f.debug_tuple("Commit").field(e).finish(),
            TransactionError::Rollback { handler, rollback } => f
                .debug_struct("Rollback")
                .field("handler", handler)
                .field("rollback", rollback)
                .finish(),
            TransactionError::Cancelled { rollback } => f
                .debug_struct("Cancelled")
                .field("rollback", rollback)
                .finish(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for TransactionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::NestedTransaction => {
                f.write_str("Unit of work already has an open transaction")
            }
            TransactionError::Begin(e) => write!(f, "Failed to begin transaction: {}", e),
            TransactionError::Handler(e) => write!(f, "{}", e),
            TransactionError::Commit(e) => write!(f, "Failed to commit transaction: {}", e),
            TransactionError::Rollback { handler, rollback } => write!(
                f,
                "{} (rollback failed as well: {})",
                handler, rollback
            ),
            TransactionError::Cancelled { rollback: None } => f.write_str("Operation cancelled"),
            TransactionError::Cancelled {
                rollback: Some(rollback),
            } => write!(f, "Operation cancelled (rollback failed: {})", rollback),
        }
    }
}

impl<E> Error for TransactionError<E>
where
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransactionError::NestedTransaction => None,
            TransactionError::Begin(e) | TransactionError::Commit(e) => Some(e),
            // The handler error is the one the caller cares about; the
            // rollback failure is reachable through the variant itself.
            TransactionError::Handler(e) | TransactionError::Rollback { handler: e, .. } => Some(e),
            TransactionError::Cancelled { rollback } => {
                rollback.as_ref().map(|e| e as &(dyn Error + 'static))
            }
        }
    }
}

// ============================================================================
// AppError conversions
// ============================================================================

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Database(e) => AppError::from(e),
            other => AppError::service_unavailable("Storage unavailable").with_source(other),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        AppError::internal("Unit of work misconfigured").with_source(err)
    }
}

impl<E> From<TransactionError<E>> for AppError
where
    E: Into<AppError>,
{
    fn from(err: TransactionError<E>) -> Self {
        match err {
            TransactionError::Handler(e) => e.into(),
            TransactionError::Rollback { handler, rollback } => {
                tracing::error!(error = %rollback, "Rollback failed after handler error");
                // Handler classification wins; the rollback failure stays attached.
                let handler: AppError = handler.into();
                AppError::new(
                    handler.kind(),
                    format!("{} (rollback failed: {})", handler.message(), rollback),
                )
                .with_source(rollback)
            }
            TransactionError::NestedTransaction => {
                AppError::internal("Unit of work already has an open transaction")
            }
            TransactionError::Begin(e) => {
                AppError::service_unavailable("Failed to begin transaction").with_source(e)
            }
            TransactionError::Commit(e) => {
                AppError::service_unavailable("Failed to commit transaction").with_source(e)
            }
            TransactionError::Cancelled { .. } => AppError::cancelled("Operation cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::error::kind::ErrorKind;

    #[derive(Debug, PartialEq, Error)]
    #[error("insufficient funds")]
    struct InsufficientFunds;

    impl From<InsufficientFunds> for AppError {
        fn from(err: InsufficientFunds) -> Self {
            AppError::unprocessable(err.to_string())
        }
    }

    #[test]
    fn test_handler_error_accessors() {
        let err: TransactionError<InsufficientFunds> = TransactionError::Handler(InsufficientFunds);
        assert_eq!(err.handler_error(), Some(&InsufficientFunds));
        assert!(!err.is_storage_failure());

        let err: TransactionError<InsufficientFunds> = TransactionError::Rollback {
            handler: InsufficientFunds,
            rollback: StorageError::Unavailable("gone".into()),
        };
        assert!(err.is_storage_failure());
        assert_eq!(err.into_handler_error(), Some(InsufficientFunds));

        let err: TransactionError<InsufficientFunds> =
            TransactionError::Commit(StorageError::Unavailable("gone".into()));
        assert!(err.handler_error().is_none());
    }

    #[test]
    fn test_rollback_failure_keeps_both_errors_in_display_and_source() {
        let err: TransactionError<InsufficientFunds> = TransactionError::Rollback {
            handler: InsufficientFunds,
            rollback: StorageError::Unavailable("connection reset".into()),
        };
        let message = err.to_string();
        assert!(message.contains("insufficient funds"));
        assert!(message.contains("connection reset"));
        assert_eq!(err.source().unwrap().to_string(), "insufficient funds");
    }

    #[test]
    fn test_handler_display_is_transparent() {
        let err: TransactionError<InsufficientFunds> = TransactionError::Handler(InsufficientFunds);
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[test]
    fn test_map_handler() {
        let err: TransactionError<InsufficientFunds> = TransactionError::Handler(InsufficientFunds);
        let mapped = err.map_handler(|e| e.to_string());
        assert_eq!(mapped.handler_error().map(String::as_str), Some("insufficient funds"));
    }

    #[test]
    fn test_rollback_failure_survives_app_error_conversion() {
        let app: AppError = TransactionError::Rollback {
            handler: InsufficientFunds,
            rollback: StorageError::Unavailable("connection reset".into()),
        }
        .into();

        assert_eq!(app.kind(), ErrorKind::UnprocessableEntity);
        assert!(app.message().starts_with("insufficient funds"));
        assert!(app.message().contains("connection reset"));
        assert_eq!(
            app.source().unwrap().to_string(),
            "Storage unavailable: connection reset"
        );
    }

    #[test]
    fn test_app_error_conversion() {
        let app: AppError = TransactionError::Handler(InsufficientFunds).into();
        assert_eq!(app.kind(), ErrorKind::UnprocessableEntity);

        let app: AppError = TransactionError::<InsufficientFunds>::Commit(
            StorageError::Unavailable("gone".into()),
        )
        .into();
        assert_eq!(app.kind(), ErrorKind::ServiceUnavailable);

        let app: AppError = TransactionError::<InsufficientFunds>::Cancelled { rollback: None }.into();
        assert_eq!(app.kind(), ErrorKind::RequestTimeout);

        let app: AppError = RegistryError::NotRegistered(ModuleKey::new("wallets")).into();
        assert_eq!(app.kind(), ErrorKind::InternalServerError);
    }
}
