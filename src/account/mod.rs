//! Account module
//!
//! Account balances live in the store behind [`crate::persistence::TransferStore`];
//! this module only holds the model.

pub mod models;

pub use models::Account;
