//! Account handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap};

use super::super::state::AppState;
use super::super::types::{AccountView, ApiError, ApiResult, ok};
use super::extract_account_id;

/// Get the caller's balance
///
/// GET /api/v1/account
#[utoipa::path(
    get,
    path = "/api/v1/account",
    params(
        ("X-Account-Id" = u64, Header, description = "Caller account id")
    ),
    responses(
        (status = 200, description = "Account balance", body = AccountView),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Account not found"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<AccountView> {
    let account_id = extract_account_id(&headers)?;

    match state.store.get_account(account_id).await? {
        Some(account) => ok(account.into()),
        None => ApiError::not_found("Account not found").into_err(),
    }
}
