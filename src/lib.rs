//! remit_engine - atomic account-to-account balance transfers
//!
//! Every transfer locks both accounts in ascending id order, checks funds,
//! moves `amount` to the receiver, charges a commission to the sender and
//! appends an immutable ledger record, all in one unit of work.
//!
//! # Modules
//!
//! - [`core_types`] - Account and transfer identifiers
//! - [`money`] - Fixed-scale decimal parsing and rounding
//! - [`fee`] - Commission policy
//! - [`account`] - Account model
//! - [`ledger`] - Transfer records and participant-scoped queries
//! - [`persistence`] - Store traits, in-memory and PostgreSQL stores
//! - [`transfer`] - Transfer coordinator (locking, validation, retry)
//! - [`notify`] - Post-commit event outbox and subscribers
//! - [`gateway`] - HTTP API
//! - [`config`] - YAML configuration
//! - [`logging`] - Tracing setup
//! - [`db`] - PostgreSQL pool

// Core types - must be first!
pub mod core_types;

pub mod account;
pub mod fee;
pub mod ledger;
pub mod money;
pub mod notify;
pub mod persistence;
pub mod transfer;

// Service plumbing
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use account::Account;
pub use core_types::{AccountId, TransferId};
pub use fee::{CommissionPolicy, CommissionQuote};
pub use ledger::{LedgerPage, LedgerQuery, TransferRecord};
pub use notify::{NotificationOutbox, TransferEvent, TransferNotifier};
pub use persistence::{LedgerReader, MemoryStore, PgStore, StoreError, TransferStore, UnitOfWork};
pub use transfer::{CreateTransfer, TransferCoordinator, TransferError, TransferState};
