//! Core types used throughout the system
//!
//! Identifier types shared by the account store, the transfer ledger and the
//! coordinator.

use std::fmt;
use std::str::FromStr;

/// Account ID - globally unique, immutable after assignment.
///
/// # Usage:
/// - Primary key of the `accounts` table (stored as BIGINT)
/// - Lock ordering key: accounts are always locked in ascending `AccountId`
pub type AccountId = u64;

/// Transfer ID - ULID-based unique identifier for a ledger record
///
/// Using ULID provides:
/// - Monotonic, sortable IDs (newest-first ordering ties break on the id)
/// - No coordination needed between workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    /// Generate a new unique TransferId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl serde::Serialize for TransferId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for TransferId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|e| D::Error::custom(format!("Invalid transfer id: {}", e)))
    }
}
