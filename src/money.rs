//! Money Conversion Module
//!
//! Every monetary value in the system is a `rust_decimal::Decimal` held at a
//! fixed scale of [`MONEY_SCALE`] fractional digits. All conversions between
//! client strings, stored NUMERIC columns and in-memory values go through this
//! module.
//!
//! ## Design Principles
//! 1. Fixed precision: balances, amounts, fees and snapshots share one scale
//! 2. Explicit Error Handling: No silent truncation of client input
//! 3. Deterministic rounding: only computed values (fees) are ever rounded
//!
//! ## Usage
//! ```rust
//! use remit_engine::money::{format_amount, parse_amount};
//!
//! let amount = parse_amount("100.5").unwrap();
//! assert_eq!(format_amount(amount), "100.5000");
//! ```

use rust_decimal::prelude::*;
use thiserror::Error;

/// Fractional digits stored for every monetary value (`NUMERIC(20,4)`)
pub const MONEY_SCALE: u32 = 4;

/// Fractional digits allowed for a commission rate (`NUMERIC(9,6)`)
pub const RATE_SCALE: u32 = 6;

/// Integer digits allowed by `NUMERIC(20,4)`
const MAX_INTEGER_DIGITS: u32 = 16;

// ============================================================================
// Error Types
// ============================================================================

/// Money conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Parse: Client → Internal (String → Decimal)
// ============================================================================

/// Convert a client string amount into a normalized positive Decimal
///
/// # Errors
/// * `InvalidFormat` - empty, signed, exponent, `.5` or `5.` shapes, garbage
/// * `PrecisionOverflow` - more than [`MONEY_SCALE`] fractional digits
/// * `InvalidAmount` - zero
/// * `Overflow` - more integer digits than the storage column holds
pub fn parse_amount(amount_str: &str) -> Result<Decimal, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if amount_str.starts_with('-') || amount_str.starts_with('+') {
        return Err(MoneyError::InvalidAmount);
    }

    let parts: Vec<&str> = amount_str.split('.').collect();
    let (whole, frac) = match parts.len() {
        1 => (parts[0], ""),
        2 => {
            // Require both sides of the dot: no ".5" or "5."
            if parts[0].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing leading zero (e.g., use 0.5 instead of .5)".into(),
                ));
            }
            if parts[1].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            (parts[0], parts[1])
        }
        _ => return Err(MoneyError::InvalidFormat("multiple decimal points".into())),
    };

    if !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in whole part: {}",
            whole
        )));
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in fractional part: {}",
            frac
        )));
    }

    if frac.len() > MONEY_SCALE as usize {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: MONEY_SCALE,
        });
    }

    if whole.trim_start_matches('0').len() > MAX_INTEGER_DIGITS as usize {
        return Err(MoneyError::Overflow);
    }

    let decimal = Decimal::from_str(amount_str)
        .map_err(|e| MoneyError::InvalidFormat(e.to_string()))?;

    validate_amount(decimal)
}

/// Validate an already-typed Decimal amount and normalize it to [`MONEY_SCALE`]
///
/// Used by callers that bypass string parsing (library callers, tests).
pub fn validate_amount(amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(MoneyError::InvalidAmount);
    }

    let amount = amount.normalize();
    if amount.scale() > MONEY_SCALE {
        return Err(MoneyError::PrecisionOverflow {
            provided: amount.scale(),
            max: MONEY_SCALE,
        });
    }

    if amount >= max_amount() {
        return Err(MoneyError::Overflow);
    }

    Ok(to_money_scale(amount))
}

/// Validate a commission rate: `0 <= rate < 1`, at most [`RATE_SCALE`] digits
pub fn validate_rate(rate: Decimal) -> Result<Decimal, MoneyError> {
    if rate.is_sign_negative() || rate >= Decimal::ONE {
        return Err(MoneyError::InvalidAmount);
    }

    let rate = rate.normalize();
    if rate.scale() > RATE_SCALE {
        return Err(MoneyError::PrecisionOverflow {
            provided: rate.scale(),
            max: RATE_SCALE,
        });
    }

    Ok(rate)
}

// ============================================================================
// Rounding / Scaling
// ============================================================================

/// Round a computed value to [`MONEY_SCALE`] (midpoint away from zero)
///
/// The result always carries exactly [`MONEY_SCALE`] fractional digits, so
/// `Display` renders e.g. `1.5000`.
pub fn round_money(value: Decimal) -> Decimal {
    to_money_scale(
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
    )
}

/// Pad a value that already fits [`MONEY_SCALE`] to exactly that scale
fn to_money_scale(mut value: Decimal) -> Decimal {
    value.rescale(MONEY_SCALE);
    value
}

fn max_amount() -> Decimal {
    Decimal::from(10u64.pow(MAX_INTEGER_DIGITS))
}

// ============================================================================
// Format: Internal → Client (Decimal → String)
// ============================================================================

/// Render a monetary value with exactly [`MONEY_SCALE`] fractional digits
pub fn format_amount(value: Decimal) -> String {
    format!("{:.prec$}", value, prec = MONEY_SCALE as usize)
}
