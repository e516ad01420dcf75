//! Per-account subscriptions
//!
//! Consumers register an unbounded sender for an account and receive the
//! events of transfers that account took part in.
//!
//! The service binary has no push transport, so it dispatches to
//! [`TracingNotifier`] only. Embedders that add one (WebSocket, SSE, a
//! message bus) hand an `Arc<SubscriberRegistry>` to
//! [`spawn_dispatcher`](super::spawn_dispatcher) and let each connection call
//! [`SubscriberRegistry::subscribe`] for its authenticated account.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{NotifyError, TransferEvent, TransferNotifier};
use crate::core_types::AccountId;

pub type EventSender = mpsc::UnboundedSender<TransferEvent>;

pub type SubscriptionId = u64;

/// Registry of live subscriptions, keyed by account
pub struct SubscriberRegistry {
    /// account_id -> list of (subscription_id, sender)
    subscribers: DashMap<AccountId, Vec<(SubscriptionId, EventSender)>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to an account's transfers
    pub fn subscribe(
        &self,
        account_id: AccountId,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<TransferEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers
            .entry(account_id)
            .or_insert_with(Vec::new)
            .push((id, tx));

        info!(account_id, subscription_id = id, "Subscriber added");
        (id, rx)
    }

    pub fn unsubscribe(&self, account_id: AccountId, id: SubscriptionId) {
        let now_empty = match self.subscribers.get_mut(&account_id) {
            Some(mut senders) => {
                senders.retain(|(sid, _)| *sid != id);
                senders.is_empty()
            }
            None => return,
        };
        if now_empty {
            self.subscribers
                .remove_if(&account_id, |_, senders| senders.is_empty());
        }
        info!(account_id, subscription_id = id, "Subscriber removed");
    }

    /// Deliver to every subscriber of every participant.
    ///
    /// Closed receivers are pruned. Returns the number of deliveries.
    pub fn dispatch(&self, event: &TransferEvent) -> usize {
        let mut delivered = 0;
        for account_id in event.participants() {
            if let Some(mut senders) = self.subscribers.get_mut(&account_id) {
                senders.retain(|(_, tx)| tx.send(event.clone()).is_ok());
                delivered += senders.len();
            }
        }
        self.subscribers.retain(|_, senders| !senders.is_empty());

        debug!(
            transfer_id = %event.transfer_id,
            delivered,
            "Transfer event dispatched"
        );
        delivered
    }

    /// (accounts with subscribers, total subscriptions)
    pub fn stats(&self) -> (usize, usize) {
        let total = self.subscribers.iter().map(|e| e.value().len()).sum();
        (self.subscribers.len(), total)
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferNotifier for SubscriberRegistry {
    async fn notify(&self, event: &TransferEvent) -> Result<(), NotifyError> {
        if self.dispatch(event) == 0 {
            return Err(NotifyError::Unreachable(event.sender_id));
        }
        Ok(())
    }
}

/// Logs every event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl TransferNotifier for TracingNotifier {
    async fn notify(&self, event: &TransferEvent) -> Result<(), NotifyError> {
        info!(
            transfer_id = %event.transfer_id,
            sender_id = event.sender_id,
            receiver_id = event.receiver_id,
            "{}",
            event.message
        );
        Ok(())
    }
}
