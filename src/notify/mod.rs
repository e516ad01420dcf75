//! Post-commit transfer notifications
//!
//! The coordinator hands a [`TransferEvent`] to the [`NotificationOutbox`]
//! once a transfer has committed. A background dispatcher drains the outbox
//! and calls a [`TransferNotifier`]. Delivery is best-effort and at-most-once:
//! a full queue or a failing notifier never affects the transfer itself.

pub mod outbox;
pub mod subscribers;

pub use outbox::{NotificationOutbox, spawn_dispatcher};
pub use subscribers::{SubscriberRegistry, SubscriptionId, TracingNotifier};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core_types::{AccountId, TransferId};
use crate::ledger::TransferRecord;

pub const DEFAULT_EVENT_MESSAGE: &str = "Transaction created successfully";

/// Event emitted after a transfer commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename = "TransferCreated")]
pub struct TransferEvent {
    pub transfer_id: TransferId,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub message: String,
}

impl TransferEvent {
    pub fn new(transfer_id: TransferId, sender_id: AccountId, receiver_id: AccountId) -> Self {
        Self {
            transfer_id,
            sender_id,
            receiver_id,
            message: DEFAULT_EVENT_MESSAGE.to_string(),
        }
    }

    /// Accounts that should hear about this transfer, each once
    pub fn participants(&self) -> impl Iterator<Item = AccountId> {
        let receiver = (self.receiver_id != self.sender_id).then_some(self.receiver_id);
        std::iter::once(self.sender_id).chain(receiver)
    }
}

impl From<&TransferRecord> for TransferEvent {
    fn from(record: &TransferRecord) -> Self {
        Self::new(record.id, record.sender_id, record.receiver_id)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("No subscriber reachable for account {0}")]
    Unreachable(AccountId),

    #[error("Notifier failed: {0}")]
    Failed(String),
}

/// Receiver of committed-transfer events
#[async_trait]
pub trait TransferNotifier: Send + Sync {
    async fn notify(&self, event: &TransferEvent) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let id = TransferId::new();
        let event = TransferEvent::new(id, 7, 9);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "TransferCreated");
        assert_eq!(json["transfer_id"], id.to_string());
        assert_eq!(json["sender_id"], 7);
        assert_eq!(json["message"], DEFAULT_EVENT_MESSAGE);

        let back: TransferEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_participants_are_distinct() {
        let id = TransferId::new();
        let both: Vec<_> = TransferEvent::new(id, 1, 2).participants().collect();
        assert_eq!(both, vec![1, 2]);

        let own: Vec<_> = TransferEvent::new(id, 5, 5).participants().collect();
        assert_eq!(own, vec![5]);
    }
}
