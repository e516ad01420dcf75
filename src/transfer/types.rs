//! Inbound transfer request

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::TransferError;
use crate::core_types::AccountId;
use crate::money;

/// `CreateTransfer { sender_id, receiver_id, amount }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransfer {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Decimal,
}

impl CreateTransfer {
    pub fn new(sender_id: AccountId, receiver_id: AccountId, amount: Decimal) -> Self {
        Self {
            sender_id,
            receiver_id,
            amount,
        }
    }

    /// Shape checks that need no storage access.
    ///
    /// Returns the amount normalised to money scale.
    pub fn validate(&self) -> Result<Decimal, TransferError> {
        if self.sender_id == 0 {
            return Err(TransferError::InvalidAccount("sender_id must be non-zero".into()));
        }
        if self.receiver_id == 0 {
            return Err(TransferError::InvalidAccount(
                "receiver_id must be non-zero".into(),
            ));
        }
        Ok(money::validate_amount(self.amount)?)
    }
}
