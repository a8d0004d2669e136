//! Domain Entities

use kernel::id::{CustomerId, WalletId};

use crate::domain::value_objects::Currency;
use crate::error::{WalletError, WalletResult};

/// Wallet entity - one customer's balance in one currency.
///
/// Amounts are minor units (cents). The balance never goes negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    id: WalletId,
    owner_id: CustomerId,
    currency: Currency,
    balance: i64,
}

impl Wallet {
    /// Open an empty wallet for `owner_id`.
    pub fn open(owner_id: CustomerId, currency: Currency) -> Self {
        Self {
            id: WalletId::new(),
            owner_id,
            currency,
            balance: 0,
        }
    }

    /// Rebuild a wallet from storage.
    pub fn restore(id: WalletId, owner_id: CustomerId, currency: Currency, balance: i64) -> Self {
        Self {
            id,
            owner_id,
            currency,
            balance,
        }
    }

    pub fn id(&self) -> WalletId {
        self.id
    }

    pub fn owner_id(&self) -> CustomerId {
        self.owner_id
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Add `amount` and return the new balance.
    pub fn credit(&mut self, amount: i64) -> WalletResult<i64> {
        ensure_positive(amount)?;
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow(self.id))?;
        Ok(self.balance)
    }

    /// Take `amount` and return the new balance.
    ///
    /// The wallet is left untouched when the funds are insufficient.
    pub fn debit(&mut self, amount: i64) -> WalletResult<i64> {
        ensure_positive(amount)?;
        if amount > self.balance {
            return Err(WalletError::InsufficientFunds {
                wallet_id: self.id,
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }
}

fn ensure_positive(amount: i64) -> WalletResult<()> {
    if amount > 0 {
        Ok(())
    } else {
        Err(WalletError::InvalidAmount(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(balance: i64) -> Wallet {
        let mut wallet = Wallet::open(CustomerId::new(), Currency::parse("EUR").unwrap());
        if balance > 0 {
            wallet.credit(balance).unwrap();
        }
        wallet
    }

    #[test]
    fn test_open_starts_empty() {
        let owner = CustomerId::new();
        let wallet = Wallet::open(owner, Currency::parse("PLN").unwrap());
        assert_eq!(wallet.balance(), 0);
        assert_eq!(wallet.owner_id(), owner);
        assert_eq!(wallet.currency().as_str(), "PLN");
    }

    #[test]
    fn test_debit_reduces_balance() {
        let mut wallet = wallet(100);
        assert_eq!(wallet.debit(40).unwrap(), 60);
        assert_eq!(wallet.debit(60).unwrap(), 0);
        assert_eq!(wallet.balance(), 0);
    }

    #[test]
    fn test_debit_insufficient_funds_leaves_balance() {
        let mut wallet = wallet(50);
        let err = wallet.debit(51).unwrap_err();
        assert!(matches!(
            err,
            WalletError::InsufficientFunds {
                balance: 50,
                requested: 51,
                ..
            }
        ));
        assert_eq!(wallet.balance(), 50);
    }

    #[test]
    fn test_non_positive_amounts_are_rejected() {
        let mut wallet = wallet(50);
        assert!(matches!(wallet.debit(0), Err(WalletError::InvalidAmount(0))));
        assert!(matches!(wallet.debit(-5), Err(WalletError::InvalidAmount(-5))));
        assert!(matches!(wallet.credit(0), Err(WalletError::InvalidAmount(0))));
        assert_eq!(wallet.balance(), 50);
    }

    #[test]
    fn test_credit_overflow() {
        let mut wallet = wallet(i64::MAX);
        assert!(matches!(wallet.credit(1), Err(WalletError::BalanceOverflow(_))));
        assert_eq!(wallet.balance(), i64::MAX);
    }
}
