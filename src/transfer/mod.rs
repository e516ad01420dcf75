//! Balance transfer engine
//!
//! # Unit of work
//!
//! ```text
//! STARTED → LOCKED → VALIDATED → MUTATED → PERSISTED → COMMITTED → (NOTIFY_SENT)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Ordered locking**: accounts are locked in ascending id order, never by role
//! 2. **Total rollback**: any failure before commit leaves balances and ledger untouched
//! 3. **Whole-unit retry**: a lock conflict restarts from `STARTED`, never mid-way
//! 4. **Notify after commit**: no external I/O while locks are held

pub mod coordinator;
pub mod error;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use coordinator::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF, TransferCoordinator};
pub use error::TransferError;
pub use state::TransferState;
pub use types::CreateTransfer;
