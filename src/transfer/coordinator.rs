//! Transfer Coordinator
//!
//! Runs one transfer as a single unit of work: lock both accounts, check
//! funds, apply deltas, stage the ledger record and commit. Lock conflicts
//! re-run the whole unit from the start, up to `max_attempts` times.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::error::TransferError;
use super::state::TransferState;
use super::types::CreateTransfer;
use crate::core_types::{AccountId, TransferId};
use crate::fee::{CommissionPolicy, CommissionQuote};
use crate::ledger::TransferRecord;
use crate::money;
use crate::notify::{NotificationOutbox, TransferEvent};
use crate::persistence::{StoreError, TransferStore};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Outcome of a single attempt
enum AttemptError {
    /// Transient; the whole unit of work may run again
    Conflict(String),
    Failed(TransferError),
}

impl From<StoreError> for AttemptError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::LockConflict(reason) => AttemptError::Conflict(reason),
            other => AttemptError::Failed(other.into()),
        }
    }
}

impl From<TransferError> for AttemptError {
    fn from(e: TransferError) -> Self {
        AttemptError::Failed(e)
    }
}

pub struct TransferCoordinator {
    store: Arc<dyn TransferStore>,
    policy: CommissionPolicy,
    outbox: NotificationOutbox,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl TransferCoordinator {
    pub fn new(
        store: Arc<dyn TransferStore>,
        policy: CommissionPolicy,
        outbox: NotificationOutbox,
    ) -> Self {
        Self {
            store,
            policy,
            outbox,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Override the retry budget. `max_attempts` is at least 1.
    pub fn with_retry(mut self, max_attempts: u32, retry_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn policy(&self) -> &CommissionPolicy {
        &self.policy
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Validate an inbound request, then run it
    pub async fn submit(&self, request: CreateTransfer) -> Result<TransferRecord, TransferError> {
        let amount = request.validate()?;
        self.transfer(request.sender_id, request.receiver_id, amount)
            .await
    }

    /// Advisory funds check on an unlocked read.
    ///
    /// The authoritative check happens again under lock inside `transfer`.
    pub async fn precheck_sufficient_funds(
        &self,
        sender_id: AccountId,
        amount: Decimal,
    ) -> Result<bool, TransferError> {
        let amount = money::validate_amount(amount)?;
        let quote = self.policy.quote(amount);
        let account = self
            .store
            .get_account(sender_id)
            .await?
            .ok_or(TransferError::NotFound(sender_id))?;
        Ok(account.can_debit(quote.total_debit))
    }

    /// Move `amount` from `sender_id` to `receiver_id`, charging commission
    /// to the sender.
    ///
    /// On success the record is committed and an event has been offered to
    /// the outbox. On any error nothing was written.
    pub async fn transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Decimal,
    ) -> Result<TransferRecord, TransferError> {
        let amount = money::validate_amount(amount)?;
        let quote = self.policy.quote(amount);

        for attempt in 1..=self.max_attempts {
            match self
                .run_once(sender_id, receiver_id, amount, &quote, attempt)
                .await
            {
                Ok(record) => {
                    let mut state = TransferState::Committed;
                    if self.outbox.publish(TransferEvent::from(&record)) {
                        state = TransferState::NotifySent;
                    }
                    info!(
                        transfer_id = %record.id,
                        sender_id,
                        receiver_id,
                        amount = %record.amount,
                        fee = %record.commission_fee,
                        attempt,
                        state = %state,
                        "Transfer committed"
                    );
                    return Ok(record);
                }
                Err(AttemptError::Conflict(reason)) => {
                    warn!(
                        sender_id,
                        receiver_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        reason = %reason,
                        "Lock conflict, retrying transfer"
                    );
                    if attempt < self.max_attempts && !self.retry_backoff.is_zero() {
                        tokio::time::sleep(self.retry_backoff * attempt).await;
                    }
                }
                Err(AttemptError::Failed(e)) => {
                    warn!(
                        sender_id,
                        receiver_id,
                        attempt,
                        code = e.code(),
                        error = %e,
                        "Transfer rejected"
                    );
                    return Err(e);
                }
            }
        }

        warn!(
            sender_id,
            receiver_id,
            attempts = self.max_attempts,
            "Transfer retry budget exhausted"
        );
        Err(TransferError::TransferUnavailable {
            attempts: self.max_attempts,
        })
    }

    /// One complete unit of work. Dropping `unit` on an early return rolls
    /// everything back.
    async fn run_once(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Decimal,
        quote: &CommissionQuote,
        attempt: u32,
    ) -> Result<TransferRecord, AttemptError> {
        let step = |state: TransferState| {
            debug!(sender_id, receiver_id, attempt, state = %state, "Transfer step")
        };

        step(TransferState::Started);
        let mut unit = self.store.begin().await?;

        let ids = BTreeSet::from([sender_id, receiver_id]);
        let locked = unit.lock_for_transfer(&ids).await?;
        step(TransferState::Locked);

        let sender_before = locked
            .get(&sender_id)
            .ok_or(StoreError::NotFound(sender_id))?
            .balance;
        let receiver_before = locked
            .get(&receiver_id)
            .ok_or(StoreError::NotFound(receiver_id))?
            .balance;

        if sender_before < quote.total_debit {
            return Err(TransferError::InsufficientFunds {
                required: quote.total_debit,
                available: sender_before,
            }
            .into());
        }
        step(TransferState::Validated);

        // Merged per account, so a self-transfer nets to -fee
        let mut deltas = BTreeMap::new();
        *deltas.entry(sender_id).or_insert(Decimal::ZERO) -= quote.total_debit;
        *deltas.entry(receiver_id).or_insert(Decimal::ZERO) += amount;

        let after = unit.apply_balance_deltas(&deltas).await?;
        let sender_after = *after
            .get(&sender_id)
            .ok_or(StoreError::NotFound(sender_id))?;
        let receiver_after = *after
            .get(&receiver_id)
            .ok_or(StoreError::NotFound(receiver_id))?;
        step(TransferState::Mutated);

        let record = TransferRecord {
            id: TransferId::new(),
            sender_id,
            receiver_id,
            amount,
            commission_rate: quote.rate,
            commission_fee: quote.fee,
            total_debit: quote.total_debit,
            sender_balance_before: sender_before,
            sender_balance_after: sender_after,
            receiver_balance_before: receiver_before,
            receiver_balance_after: receiver_after,
            created_at: Utc::now(),
        };
        unit.insert_transfer(&record).await?;
        step(TransferState::Persisted);

        unit.commit().await?;
        step(TransferState::Committed);

        Ok(record)
    }
}
