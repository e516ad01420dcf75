//! Per-invocation transfer progress
//!
//! ```text
//! STARTED → LOCKED → VALIDATED → MUTATED → PERSISTED → COMMITTED → NOTIFY_SENT
//! ```
//!
//! Nothing before `COMMITTED` is observable outside the unit of work. A retry
//! starts again from `STARTED`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransferState {
    /// Unit of work opened
    Started,
    /// Both account locks held
    Locked,
    /// Funds checked against the quoted total debit
    Validated,
    /// Balance deltas applied inside the unit of work
    Mutated,
    /// Ledger record staged
    Persisted,
    /// Unit of work committed; balances and record are visible
    Committed,
    /// Event handed to the outbox
    NotifySent,
}

impl TransferState {
    /// Whether the transfer's effects are durable
    #[inline]
    pub fn is_committed(&self) -> bool {
        *self >= TransferState::Committed
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Started => "STARTED",
            TransferState::Locked => "LOCKED",
            TransferState::Validated => "VALIDATED",
            TransferState::Mutated => "MUTATED",
            TransferState::Persisted => "PERSISTED",
            TransferState::Committed => "COMMITTED",
            TransferState::NotifySent => "NOTIFY_SENT",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
