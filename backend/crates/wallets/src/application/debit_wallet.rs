//! Debit Wallet Use Case

use kernel::id::WalletId;
use platform::transaction::CommandHandler;

use crate::domain::repository::WalletRepository;
use crate::error::{WalletError, WalletResult};

/// Take `amount` minor units from a wallet.
#[derive(Debug, Clone)]
pub struct DebitWallet {
    pub wallet_id: WalletId,
    pub amount: i64,
}

/// Handles [`DebitWallet`]; outputs the new balance.
#[derive(Debug, Clone)]
pub struct DebitWalletHandler<R> {
    repository: R,
}

impl<R> DebitWalletHandler<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

impl<R, Tx> CommandHandler<DebitWallet, Tx> for DebitWalletHandler<R>
where
    R: WalletRepository<Tx> + Sync,
    Tx: Send,
{
    type Output = i64;
    type Error = WalletError;

    async fn handle(&self, tx: &mut Tx, command: DebitWallet) -> WalletResult<i64> {
        let mut wallet = self
            .repository
            .get(tx, command.wallet_id)
            .await?
            .ok_or(WalletError::WalletNotFound(command.wallet_id))?;

        let balance = wallet.debit(command.amount)?;
        self.repository.update(tx, &wallet).await?;

        tracing::info!(
            wallet_id = %command.wallet_id,
            amount = command.amount,
            balance,
            "Wallet debited"
        );

        Ok(balance)
    }
}
