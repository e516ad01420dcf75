//! Data models for account balances

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::AccountId;

/// Account balance record
///
/// Owned by the account store. Balances are only mutated inside a transfer
/// unit of work and never go below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Decimal,
}

impl Account {
    pub fn new(id: AccountId, balance: Decimal) -> Self {
        Self { id, balance }
    }

    /// Whether `amount` can be debited without going negative
    #[inline]
    pub fn can_debit(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_can_debit() {
        let account = Account::new(1, dec!(101.50));
        assert!(account.can_debit(dec!(101.50)));
        assert!(account.can_debit(dec!(0.0001)));
        assert!(!account.can_debit(dec!(101.5001)));
    }
}
