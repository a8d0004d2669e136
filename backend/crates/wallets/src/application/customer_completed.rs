//! Customer Completed Use Case
//!
//! Reacts to the Customers module finishing a customer's registration by
//! opening that customer's wallet.

use kernel::id::CustomerId;
use platform::transaction::EventHandler;

use crate::domain::entities::Wallet;
use crate::domain::repository::WalletRepository;
use crate::domain::value_objects::Currency;
use crate::error::{WalletError, WalletResult};

/// Published by the Customers module. Wallets keeps its own copy of the
/// contract instead of depending on the Customers crate.
#[derive(Debug, Clone)]
pub struct CustomerCompleted {
    pub customer_id: CustomerId,
    pub currency: String,
}

/// Handles [`CustomerCompleted`]. Redelivery is harmless: a second wallet
/// for the same owner and currency is never opened.
#[derive(Debug, Clone)]
pub struct CustomerCompletedHandler<R> {
    repository: R,
}

impl<R> CustomerCompletedHandler<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

impl<R, Tx> EventHandler<CustomerCompleted, Tx> for CustomerCompletedHandler<R>
where
    R: WalletRepository<Tx> + Sync,
    Tx: Send,
{
    type Error = WalletError;

    async fn handle(&self, tx: &mut Tx, event: CustomerCompleted) -> WalletResult<()> {
        let currency = Currency::parse(&event.currency)?;

        if self
            .repository
            .exists_for_owner(tx, event.customer_id, &currency)
            .await?
        {
            tracing::debug!(
                customer_id = %event.customer_id,
                currency = %currency,
                "Wallet already exists"
            );
            return Ok(());
        }

        let wallet = Wallet::open(event.customer_id, currency);
        match self.repository.add(tx, &wallet).await {
            Ok(()) => {}
            // Lost the race against a concurrent delivery of the same event.
            Err(WalletError::OwnerAlreadyHasWallet { .. }) => {
                tracing::debug!(
                    customer_id = %event.customer_id,
                    currency = %wallet.currency(),
                    "Wallet opened concurrently"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            wallet_id = %wallet.id(),
            customer_id = %event.customer_id,
            currency = %wallet.currency(),
            "Wallet opened"
        );

        Ok(())
    }
}
