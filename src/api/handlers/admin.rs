//! Lifecycle and withdrawal handlers: end, fee withdrawals, emergency exit.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{EndPoolResponse, FeeBalanceResponse, TransferResponse};
use crate::api::extractors::Caller;
use crate::app_state::AppState;
use crate::domain::PoolId;
use crate::error::{ErrorResponse, LootpotError};

/// `POST /pools/{id}/end` — End an expired pool. Anyone may call it.
///
/// # Errors
///
/// Returns [`LootpotError::NotYetExpired`] or [`LootpotError::AlreadyEnded`].
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/end",
    tag = "Lifecycle",
    summary = "End a pool",
    params(("id" = uuid::Uuid, Path, description = "Pool address")),
    responses(
        (status = 200, description = "Pool ended", body = EndPoolResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Not yet expired or already ended", body = ErrorResponse),
    )
)]
pub async fn end_pool(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LootpotError> {
    let pool_id = PoolId::from_uuid(id);
    let ended_at = state.pool_service.end_pool(pool_id).await?;
    Ok(Json(EndPoolResponse { pool_id, ended_at }))
}

/// `POST /pools/{id}/fees/withdraw` — Send platform fees to the owner.
///
/// # Errors
///
/// Returns [`LootpotError::Unauthorized`] for any caller but the owner.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/fees/withdraw",
    tag = "Lifecycle",
    summary = "Withdraw platform fees",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool address"),
        ("x-caller-address" = String, Header, description = "Pool owner"),
    ),
    responses(
        (status = 200, description = "Fees sent", body = TransferResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn withdraw_platform_fees(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Caller(caller): Caller,
) -> Result<impl IntoResponse, LootpotError> {
    let transfer = state
        .pool_service
        .withdraw_platform_fees(PoolId::from_uuid(id), &caller)
        .await?;
    Ok(Json(TransferResponse::from(transfer)))
}

/// `POST /pools/{id}/emergency-withdraw` — Recover an ended pool's residue.
///
/// # Errors
///
/// Returns [`LootpotError::Unauthorized`] or [`LootpotError::StillActive`].
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/emergency-withdraw",
    tag = "Lifecycle",
    summary = "Emergency withdrawal",
    description = "Sends the ended pool's balance, minus unwithdrawn fees, unclaimed prizes and escrowed deposits, to the owner.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool address"),
        ("x-caller-address" = String, Header, description = "Pool owner"),
    ),
    responses(
        (status = 200, description = "Residual sent", body = TransferResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 409, description = "Pool still active", body = ErrorResponse),
    )
)]
pub async fn emergency_withdraw(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Caller(caller): Caller,
) -> Result<impl IntoResponse, LootpotError> {
    let transfer = state
        .pool_service
        .emergency_withdraw(PoolId::from_uuid(id), &caller)
        .await?;
    Ok(Json(TransferResponse::from(transfer)))
}

/// `POST /registry/fees/withdraw` — Send creation fees to the registry owner.
///
/// # Errors
///
/// Returns [`LootpotError::Unauthorized`] for any caller but the owner.
#[utoipa::path(
    post,
    path = "/api/v1/registry/fees/withdraw",
    tag = "Registry",
    summary = "Withdraw creation fees",
    params(("x-caller-address" = String, Header, description = "Registry owner")),
    responses(
        (status = 200, description = "Fees sent", body = TransferResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
    )
)]
pub async fn withdraw_registry_fees(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<impl IntoResponse, LootpotError> {
    let transfer = state.pool_service.withdraw_registry_fees(&caller).await?;
    Ok(Json(TransferResponse::from(transfer)))
}

/// `GET /registry/fees` — Creation fees awaiting withdrawal.
#[utoipa::path(
    get,
    path = "/api/v1/registry/fees",
    tag = "Registry",
    summary = "Registry fee balance",
    responses(
        (status = 200, description = "Fee balance", body = FeeBalanceResponse),
    )
)]
pub async fn registry_fee_balance(State(state): State<AppState>) -> impl IntoResponse {
    Json(FeeBalanceResponse {
        fee_balance: state.pool_service.registry_fee_balance().await,
    })
}

/// Lifecycle and withdrawal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/end", post(end_pool))
        .route("/pools/{id}/fees/withdraw", post(withdraw_platform_fees))
        .route("/pools/{id}/emergency-withdraw", post(emergency_withdraw))
        .route("/registry/fees", get(registry_fee_balance))
        .route("/registry/fees/withdraw", post(withdraw_registry_fees))
}
