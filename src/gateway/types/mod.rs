//! Gateway types module
//!
//! ## Input Types
//! - [`StrictAmount`]: Format-validated amount for API input
//! - [`CreateTransferRequest`]: Transfer request body
//!
//! ## Output Types
//! - [`DisplayAmount`]: Fixed-scale formatted amount for API responses
//! - [`TransferView`]: Participant-scoped transfer projection
//! - [`ApiResponse<T>`]: Unified API response wrapper

pub mod money;
pub mod response;
pub mod transfer;

// Re-export commonly used types at module root
pub use money::{DisplayAmount, StrictAmount};
pub use response::{ApiError, ApiResponse, ApiResult, created, error_codes, ok};
pub use transfer::{AccountView, CreateTransferRequest, TransferView};
