//! Transfer ledger records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, TransferId};

/// Immutable audit record of one committed transfer
///
/// Created exactly once at the end of a successful unit of work, never
/// updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: TransferId,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    /// Value credited to the receiver
    pub amount: Decimal,
    /// Commission rate snapshot at transfer time
    pub commission_rate: Decimal,
    pub commission_fee: Decimal,
    /// Value removed from the sender (`amount + commission_fee`)
    pub total_debit: Decimal,
    pub sender_balance_before: Decimal,
    pub sender_balance_after: Decimal,
    pub receiver_balance_before: Decimal,
    pub receiver_balance_after: Decimal,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    /// Whether `account_id` is the sender or the receiver
    #[inline]
    pub fn is_participant(&self, account_id: AccountId) -> bool {
        self.sender_id == account_id || self.receiver_id == account_id
    }

    #[inline]
    pub fn is_self_transfer(&self) -> bool {
        self.sender_id == self.receiver_id
    }

    /// Check the arithmetic invariants every committed record satisfies.
    ///
    /// For a self-transfer the sender and receiver snapshots describe the same
    /// account, so only the net effect (`-commission_fee`) is checked on the
    /// sender side.
    pub fn satisfies_invariants(&self) -> bool {
        let totals = self.total_debit == self.amount + self.commission_fee
            && self.sender_balance_before >= self.total_debit;

        if self.is_self_transfer() {
            totals
                && self.sender_balance_after == self.sender_balance_before - self.commission_fee
                && self.receiver_balance_after == self.sender_balance_after
        } else {
            totals
                && self.sender_balance_after == self.sender_balance_before - self.total_debit
                && self.receiver_balance_after == self.receiver_balance_before + self.amount
        }
    }
}

/// Page request for ledger listings (1-based pages)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Clamp to `page >= 1` and `1 <= page_size <= max_page_size`
    pub fn clamped(self, max_page_size: u32) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max_page_size.max(1)),
        }
    }

    /// Row offset of the first item on this page
    #[inline]
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.page_size as u64
    }
}

/// One page of ledger records, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPage {
    pub items: Vec<TransferRecord>,
    pub page: u32,
    pub page_size: u32,
    /// Total records visible to the participant across all pages
    pub total: u64,
}

impl LedgerPage {
    pub fn last_page(&self) -> u32 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.page_size.max(1) as u64) as u32
        }
    }
}
