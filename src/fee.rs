//! Commission calculation
//!
//! The commission is charged to the sender on top of the transferred amount:
//! `fee = round(amount * rate, MONEY_SCALE)` and `total_debit = amount + fee`.
//! The rate is injected at construction; every quote carries the rate it was
//! computed with so the ledger can snapshot it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{MoneyError, round_money, validate_rate};

/// Default commission rate (0.015 = 1.5%)
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 3);

/// Result of quoting a transfer amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionQuote {
    /// Rate snapshot used for this quote
    pub rate: Decimal,
    /// Commission charged to the sender
    pub fee: Decimal,
    /// Value removed from the sender (`amount + fee`)
    pub total_debit: Decimal,
}

/// Commission policy with a fixed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionPolicy {
    rate: Decimal,
}

impl CommissionPolicy {
    /// Create a policy, validating `0 <= rate < 1` with at most 6 fractional digits
    pub fn new(rate: Decimal) -> Result<Self, MoneyError> {
        Ok(Self {
            rate: validate_rate(rate)?,
        })
    }

    /// Current rate
    #[inline]
    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Quote the commission for `amount`.
    ///
    /// `amount` is expected at money scale (see [`crate::money::validate_amount`]).
    ///
    /// # Example
    /// ```
    /// use remit_engine::fee::CommissionPolicy;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let policy = CommissionPolicy::default();
    /// let quote = policy.quote(Decimal::from(100));
    /// assert_eq!(quote.fee, Decimal::from_str("1.5").unwrap());
    /// assert_eq!(quote.total_debit, Decimal::from_str("101.5").unwrap());
    /// ```
    pub fn quote(&self, amount: Decimal) -> CommissionQuote {
        let fee = round_money(amount * self.rate);
        CommissionQuote {
            rate: self.rate,
            fee,
            total_debit: round_money(amount + fee),
        }
    }
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            rate: DEFAULT_COMMISSION_RATE,
        }
    }
}
