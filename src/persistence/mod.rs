//! Persistence layer
//!
//! The transfer coordinator talks to storage only through the traits in this
//! module:
//!
//! - [`TransferStore`]: opens units of work and serves unlocked reads
//! - [`UnitOfWork`]: one atomic scope holding account locks until commit
//! - [`LedgerReader`]: read side of the append-only transfer ledger
//!
//! # Locking discipline
//!
//! `lock_for_transfer` takes a [`BTreeSet`] so the ids are always visited in
//! ascending order, whichever side of the transfer they belong to. Two
//! transfers moving funds in opposite directions between the same accounts
//! therefore queue on the same first lock instead of deadlocking.
//!
//! # Implementations
//!
//! - [`memory::MemoryStore`]: in-process store with one async mutex per account
//! - [`postgres::PgStore`]: PostgreSQL (`SELECT ... FOR UPDATE` in a transaction)

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::Account;
use crate::core_types::{AccountId, TransferId};
use crate::ledger::{LedgerPage, PageRequest, TransferRecord};

/// Storage errors
///
/// `LockConflict` is the only retryable variant: the coordinator re-runs the
/// whole unit of work when it sees one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Lock conflict: {0}")]
    LockConflict(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Transient serialization / deadlock / lock-timeout condition
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::LockConflict(_))
    }
}

/// SQLSTATE codes that mean "try the whole unit of work again"
const RETRYABLE_SQLSTATES: [&str; 3] = [
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available (lock_timeout)
];

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            let code = db_err.code();
            match code.as_deref() {
                Some(c) if RETRYABLE_SQLSTATES.contains(&c) => {
                    return StoreError::LockConflict(format!("{} ({})", db_err.message(), c));
                }
                Some("23503") | Some("23514") => {
                    return StoreError::Constraint(db_err.message().to_string());
                }
                _ => {}
            }
        }
        StoreError::Unavailable(e.to_string())
    }
}

/// Account store and transfer ledger writer
#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &'static str;

    /// Open a new unit of work
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Unlocked point read (advisory checks, existence checks)
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Check that the store is reachable
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// One atomic, all-or-nothing scope
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards
/// every staged change and releases its locks.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Acquire exclusive locks on `ids` in ascending order and return the
    /// current state of each account.
    ///
    /// Blocks until every lock is granted; a lock timeout surfaces as
    /// [`StoreError::LockConflict`].
    async fn lock_for_transfer(
        &mut self,
        ids: &BTreeSet<AccountId>,
    ) -> Result<BTreeMap<AccountId, Account>, StoreError>;

    /// Apply signed balance deltas to locked accounts.
    ///
    /// Returns the post-mutation balance of every touched account.
    async fn apply_balance_deltas(
        &mut self,
        deltas: &BTreeMap<AccountId, Decimal>,
    ) -> Result<BTreeMap<AccountId, Decimal>, StoreError>;

    /// Stage a ledger record
    async fn insert_transfer(&mut self, record: &TransferRecord) -> Result<(), StoreError>;

    /// Make every staged change durable and release the locks
    async fn commit(&mut self) -> Result<(), StoreError>;
}

/// Read side of the transfer ledger
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Records where `participant` is sender or receiver, newest first
    async fn list_for_participant(
        &self,
        participant: AccountId,
        page: PageRequest,
    ) -> Result<LedgerPage, StoreError>;

    /// Single record by id, regardless of participant
    async fn get_transfer(&self, id: TransferId) -> Result<Option<TransferRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lock_conflict_is_retryable() {
        assert!(StoreError::LockConflict("x".into()).is_retryable());
        assert!(!StoreError::NotFound(1).is_retryable());
        assert!(!StoreError::Unavailable("x".into()).is_retryable());
        assert!(!StoreError::Constraint("x".into()).is_retryable());
    }

    #[test]
    fn test_non_database_sqlx_error_is_unavailable() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct PgFailure {
        code: &'static str,
        message: &'static str,
    }

    impl sqlx::error::DatabaseError for PgFailure {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.code.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn db_error(code: &'static str, message: &'static str) -> StoreError {
        sqlx::Error::Database(Box::new(PgFailure { code, message })).into()
    }

    #[test]
    fn test_sqlstate_mapping() {
        for code in ["40001", "40P01", "55P03"] {
            let err = db_error(code, "could not obtain lock");
            assert!(err.is_retryable(), "{} should be a lock conflict", code);
            assert!(matches!(err, StoreError::LockConflict(ref m) if m.contains(code)));
        }

        assert!(matches!(
            db_error("23514", "violates check constraint"),
            StoreError::Constraint(_)
        ));
        assert!(matches!(
            db_error("23503", "violates foreign key constraint"),
            StoreError::Constraint(_)
        ));
        assert!(matches!(
            db_error("42P01", "relation does not exist"),
            StoreError::Unavailable(_)
        ));
    }
}
