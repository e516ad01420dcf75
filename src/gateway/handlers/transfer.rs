//! Transfer handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, CreateTransferRequest, TransferView, created, ok,
};
use super::extract_account_id;
use crate::core_types::TransferId;
use crate::money;

/// Create a transfer from the caller's account
///
/// POST /api/v1/transfers
///
/// Request rules are checked before the engine runs: the amount meets the
/// configured minimum, the receiver exists and the caller appears to have
/// enough funds. The funds check is repeated under lock by the engine.
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = CreateTransferRequest,
    params(
        ("X-Account-Id" = u64, Header, description = "Caller account id")
    ),
    responses(
        (status = 201, description = "Transfer committed", body = TransferView),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Missing caller identity"),
        (status = 422, description = "Rule violation (minimum amount, unknown receiver, insufficient funds)"),
        (status = 503, description = "Transfer unavailable, safe to resubmit")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateTransferRequest>, JsonRejection>,
) -> ApiResult<TransferView> {
    let sender_id = extract_account_id(&headers)?;
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let amount = req.amount.inner();

    if amount < state.min_amount {
        return ApiError::unprocessable(
            "amount",
            format!("must be at least {}", money::format_amount(state.min_amount)),
        )
        .into_err();
    }

    if state.store.get_account(req.receiver_id).await?.is_none() {
        return ApiError::unprocessable("receiver_id", "account does not exist").into_err();
    }

    if !state
        .coordinator
        .precheck_sufficient_funds(sender_id, amount)
        .await?
    {
        return ApiError::unprocessable("amount", "insufficient funds").into_err();
    }

    let record = state
        .coordinator
        .transfer(sender_id, req.receiver_id, amount)
        .await?;

    created(TransferView::for_participant(&record, sender_id))
}

/// Get one transfer the caller took part in
///
/// GET /api/v1/transfers/{id}
///
/// Unknown ids and other accounts' transfers get the same 404.
#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}",
    params(
        ("id" = String, Path, description = "Transfer id (ULID)"),
        ("X-Account-Id" = u64, Header, description = "Caller account id")
    ),
    responses(
        (status = 200, description = "Transfer details", body = TransferView),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Transfer not found")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<TransferView> {
    let viewer = extract_account_id(&headers)?;
    let not_found = || ApiError::not_found("Transfer not found");

    let id: TransferId = id.parse().map_err(|_| not_found())?;
    let record = state
        .ledger
        .get_transfer(id, viewer)
        .await?
        .ok_or_else(not_found)?;

    ok(TransferView::for_participant(&record, viewer))
}
