//! Bounded post-commit outbox and its dispatcher task

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{TransferEvent, TransferNotifier};

pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// Producer side of the notification queue
///
/// `publish` never waits: when the queue is full or the dispatcher is gone
/// the event is dropped and logged.
#[derive(Clone)]
pub struct NotificationOutbox {
    tx: mpsc::Sender<TransferEvent>,
}

impl NotificationOutbox {
    /// Create an outbox and the receiver its dispatcher drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TransferEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Outbox whose events go nowhere (tests, tools)
    pub fn disconnected() -> Self {
        let (outbox, _rx) = Self::channel(1);
        outbox
    }

    /// Queue an event. Returns whether it was accepted.
    pub fn publish(&self, event: TransferEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    transfer_id = %event.transfer_id,
                    "Notification queue full, event dropped"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    transfer_id = %event.transfer_id,
                    "Notification dispatcher stopped, event dropped"
                );
                false
            }
        }
    }
}

/// Drain `rx` into `notifier` until every outbox handle is dropped
pub fn spawn_dispatcher(
    mut rx: mpsc::Receiver<TransferEvent>,
    notifier: Arc<dyn TransferNotifier>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Notification dispatcher started");
        while let Some(event) = rx.recv().await {
            match notifier.notify(&event).await {
                Ok(()) => debug!(transfer_id = %event.transfer_id, "Notification delivered"),
                Err(e) => warn!(
                    transfer_id = %event.transfer_id,
                    error = %e,
                    "Notification failed"
                ),
            }
        }
        info!("Notification dispatcher stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::TransferId;
    use crate::notify::NotifyError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<TransferId>>,
        fail: bool,
    }

    #[async_trait]
    impl TransferNotifier for Recording {
        async fn notify(&self, event: &TransferEvent) -> Result<(), NotifyError> {
            self.seen.lock().unwrap().push(event.transfer_id);
            if self.fail {
                return Err(NotifyError::Failed("boom".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let (outbox, _rx) = NotificationOutbox::channel(1);
        assert!(outbox.publish(TransferEvent::new(TransferId::new(), 1, 2)));
        assert!(!outbox.publish(TransferEvent::new(TransferId::new(), 1, 2)));
    }

    #[test]
    fn test_disconnected_outbox_drops() {
        let outbox = NotificationOutbox::disconnected();
        assert!(!outbox.publish(TransferEvent::new(TransferId::new(), 1, 2)));
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_in_order_and_survives_failures() {
        let notifier = Arc::new(Recording {
            fail: true,
            ..Default::default()
        });
        let (outbox, rx) = NotificationOutbox::channel(8);
        let handle = spawn_dispatcher(rx, notifier.clone());

        let ids = [TransferId::new(), TransferId::new()];
        for id in ids {
            assert!(outbox.publish(TransferEvent::new(id, 1, 2)));
        }
        drop(outbox);
        handle.await.unwrap();

        assert_eq!(*notifier.seen.lock().unwrap(), ids.to_vec());
    }
}
