//! Domain Value Objects

use std::fmt;

use crate::error::{WalletError, WalletResult};

/// ISO 4217 style currency code: three ASCII letters, stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Currency(String);

impl Currency {
    pub fn parse(code: &str) -> WalletResult<Self> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(WalletError::InvalidCurrency(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        assert_eq!(Currency::parse("eur").unwrap().as_str(), "EUR");
        assert_eq!(Currency::parse(" PLN ").unwrap().to_string(), "PLN");
    }

    #[test]
    fn test_parse_rejects_malformed_codes() {
        for code in ["", "EU", "EURO", "E1R", "€UR"] {
            assert!(
                matches!(Currency::parse(code), Err(WalletError::InvalidCurrency(_))),
                "{code} should be rejected"
            );
        }
    }
}
