//! HTTP handlers
//!
//! Identity comes from the `X-Account-Id` header set by the upstream
//! authentication layer.

pub mod account;
pub mod health;
pub mod transfer;

pub use account::get_account;
pub use health::{HealthResponse, health_check};
pub use transfer::{create_transfer, get_transfer};

use axum::http::HeaderMap;

use super::types::ApiError;
use crate::core_types::AccountId;

pub const ACCOUNT_HEADER: &str = "X-Account-Id";

/// Extract the caller's account id from HTTP headers
pub(crate) fn extract_account_id(headers: &HeaderMap) -> Result<AccountId, ApiError> {
    let raw = headers
        .get(ACCOUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized(format!("Missing {} header", ACCOUNT_HEADER)))?;

    match raw.trim().parse::<AccountId>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!(
            "Invalid {} header",
            ACCOUNT_HEADER
        ))),
    }
}
