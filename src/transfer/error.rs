//! Transfer Error Types

use rust_decimal::Decimal;
use thiserror::Error;

use crate::core_types::AccountId;
use crate::money::MoneyError;
use crate::persistence::StoreError;

/// Transfer error types
///
/// Codes are stable and used verbatim in API responses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Amount precision exceeds {max} decimal places")]
    PrecisionOverflow { max: u32 },

    #[error("Amount would cause overflow")]
    Overflow,

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    // === Business Errors ===
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    // === System Errors ===
    #[error("Transfer unavailable after {attempts} attempts")]
    TransferUnavailable { attempts: u32 },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::PrecisionOverflow { .. } => "PRECISION_OVERFLOW",
            TransferError::Overflow => "OVERFLOW",
            TransferError::InvalidAccount(_) => "INVALID_ACCOUNT",
            TransferError::NotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::TransferUnavailable { .. } => "TRANSFER_UNAVAILABLE",
            TransferError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount
            | TransferError::PrecisionOverflow { .. }
            | TransferError::Overflow
            | TransferError::InvalidAccount(_) => 400,
            TransferError::NotFound(_) => 404,
            TransferError::InsufficientFunds { .. } => 422,
            TransferError::TransferUnavailable { .. } | TransferError::StorageUnavailable(_) => {
                503
            }
        }
    }

    /// Whether resubmitting the same request later may succeed
    pub fn is_resubmittable(&self) -> bool {
        matches!(
            self,
            TransferError::TransferUnavailable { .. } | TransferError::StorageUnavailable(_)
        )
    }
}

impl From<MoneyError> for TransferError {
    fn from(e: MoneyError) -> Self {
        match e {
            MoneyError::InvalidAmount => TransferError::InvalidAmount,
            MoneyError::PrecisionOverflow { max, .. } => TransferError::PrecisionOverflow { max },
            MoneyError::Overflow => TransferError::Overflow,
            MoneyError::InvalidFormat(_) => TransferError::InvalidAmount,
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => TransferError::NotFound(id),
            // A lock conflict escaping the retry loop is treated as exhaustion of one attempt
            StoreError::LockConflict(_) => TransferError::TransferUnavailable { attempts: 1 },
            StoreError::Constraint(msg)
            | StoreError::Unavailable(msg)
            | StoreError::Corrupt(msg) => TransferError::StorageUnavailable(msg),
        }
    }
}
