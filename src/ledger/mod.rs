//! Transfer ledger
//!
//! Append-only audit trail of committed transfers. Records are written by the
//! transfer coordinator inside its unit of work and read back here.

pub mod models;
pub mod query;

pub use models::{LedgerPage, PageRequest, TransferRecord};
pub use query::{DEFAULT_PAGE_SIZE, LedgerQuery, MAX_PAGE_SIZE};
