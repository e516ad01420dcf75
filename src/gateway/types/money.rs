//! Money types at the HTTP boundary
//!
//! - `StrictAmount`: strictly parsed inbound amount
//! - `DisplayAmount`: fixed-scale outbound amount

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money;

/// Inbound amount, validated while deserializing
///
/// Only JSON strings are accepted so no precision is lost in transit. Format
/// rules are those of [`money::parse_amount`]: no sign, no `.5` or `5.`
/// shapes, at most four fractional digits, strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictAmount(Decimal);

impl StrictAmount {
    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl<'de> Deserialize<'de> for StrictAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let s = String::deserialize(deserializer)?;
        money::parse_amount(&s)
            .map(StrictAmount)
            .map_err(|e| D::Error::custom(format!("invalid amount {:?}: {}", s, e)))
    }
}

impl Serialize for StrictAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&money::format_amount(self.0))
    }
}

/// Outbound amount, always rendered with four fractional digits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DisplayAmount(String);

impl DisplayAmount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Decimal> for DisplayAmount {
    fn from(value: Decimal) -> Self {
        Self(money::format_amount(value))
    }
}

impl std::fmt::Display for DisplayAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
