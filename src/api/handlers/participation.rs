//! Participation handlers: join, deferred draws, claims, history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    DepositRequest, FulfillRequest, FulfillResponse, TransferResponse, UserHistoryResponse,
};
use crate::api::extractors::Caller;
use crate::app_state::AppState;
use crate::domain::{Address, DrawTicket, JoinReceipt, ParticipantRecord, PoolId};
use crate::error::{ErrorResponse, LootpotError};

/// `POST /pools/{id}/join` — Deposit and draw in one call.
///
/// # Errors
///
/// Returns [`LootpotError::InactivePool`], [`LootpotError::BelowMinimum`],
/// [`LootpotError::DuplicateParticipant`] or
/// [`LootpotError::OracleUnavailable`]; the pool is unchanged on error.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/join",
    tag = "Participation",
    summary = "Join a pool",
    description = "Deposits the attached amount and settles the draw immediately. A winner's prize is credited to their claimable balance.",
    request_body = DepositRequest,
    params(
        ("id" = uuid::Uuid, Path, description = "Pool address"),
        ("x-caller-address" = String, Header, description = "Participant address"),
    ),
    responses(
        (status = 200, description = "Draw settled", body = JoinReceipt),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool inactive or already joined", body = ErrorResponse),
        (status = 422, description = "Deposit below minimum", body = ErrorResponse),
        (status = 503, description = "Randomness unavailable", body = ErrorResponse),
    )
)]
pub async fn join_pool(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Caller(participant): Caller,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, LootpotError> {
    let receipt = state
        .pool_service
        .join_pool(PoolId::from_uuid(id), participant, req.amount)
        .await?;
    Ok(Json(receipt))
}

/// `POST /pools/{id}/draws` — Deposit and request a deferred draw.
///
/// # Errors
///
/// Same preconditions as [`join_pool`], minus the oracle.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/draws",
    tag = "Participation",
    summary = "Request a deferred draw",
    description = "Escrows the deposit and records a pending draw. The outcome is applied when a provider fulfills the returned request id.",
    request_body = DepositRequest,
    params(
        ("id" = uuid::Uuid, Path, description = "Pool address"),
        ("x-caller-address" = String, Header, description = "Participant address"),
    ),
    responses(
        (status = 202, description = "Draw pending", body = DrawTicket),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool inactive or already joined", body = ErrorResponse),
        (status = 422, description = "Deposit below minimum", body = ErrorResponse),
    )
)]
pub async fn request_draw(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Caller(participant): Caller,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, LootpotError> {
    let ticket = state
        .pool_service
        .request_draw(PoolId::from_uuid(id), participant, req.amount)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(ticket)))
}

/// `POST /pools/{id}/draws/{request_id}/fulfill` — Deliver a random word.
///
/// Only the configured randomness provider may call this; participants
/// cannot settle their own draws. Unknown or already settled request ids
/// are acknowledged with `applied: false` and change nothing.
///
/// # Errors
///
/// Returns [`LootpotError::InvalidRequest`] without a caller header,
/// [`LootpotError::Unauthorized`] for any caller but the provider, or
/// [`LootpotError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/draws/{request_id}/fulfill",
    tag = "Participation",
    summary = "Fulfill a deferred draw",
    description = "Applies the randomness provider's word to a pending draw. Callers other than the provider are rejected before the draw is touched.",
    request_body = FulfillRequest,
    params(
        ("id" = uuid::Uuid, Path, description = "Pool address"),
        ("request_id" = uuid::Uuid, Path, description = "Draw request id"),
        ("x-caller-address" = String, Header, description = "Randomness provider address"),
    ),
    responses(
        (status = 200, description = "Fulfillment processed", body = FulfillResponse),
        (status = 400, description = "Missing caller header", body = ErrorResponse),
        (status = 403, description = "Caller is not the randomness provider", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn fulfill_draw(
    State(state): State<AppState>,
    Path((id, request_id)): Path<(uuid::Uuid, uuid::Uuid)>,
    Caller(provider): Caller,
    Json(req): Json<FulfillRequest>,
) -> Result<impl IntoResponse, LootpotError> {
    let settlement = state
        .pool_service
        .fulfill_draw(PoolId::from_uuid(id), request_id, req.random_word, &provider)
        .await?;
    Ok(Json(FulfillResponse {
        request_id,
        applied: settlement.is_some(),
        settlement,
    }))
}

/// `GET /pools/{id}/participants/{address}` — Participant record.
///
/// Addresses that never joined yield the zero record.
///
/// # Errors
///
/// Returns [`LootpotError::PoolNotFound`] or
/// [`LootpotError::InvalidRequest`] for a malformed address.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/participants/{address}",
    tag = "Participation",
    summary = "Get participant info",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool address"),
        ("address" = String, Path, description = "Participant address"),
    ),
    responses(
        (status = 200, description = "Participant record", body = ParticipantRecord),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_participant(
    State(state): State<AppState>,
    Path((id, address)): Path<(uuid::Uuid, String)>,
) -> Result<impl IntoResponse, LootpotError> {
    let address = Address::new(&address)?;
    let record = state
        .pool_service
        .participant(PoolId::from_uuid(id), &address)
        .await?;
    Ok(Json(record))
}

/// `POST /pools/{id}/claim` — Pay out the caller's claimable balance.
///
/// # Errors
///
/// Returns [`LootpotError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/claim",
    tag = "Participation",
    summary = "Claim prizes and refunds",
    description = "Sends everything credited to the caller in this pool. Claiming with nothing owed returns a zero transfer.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pool address"),
        ("x-caller-address" = String, Header, description = "Claimant address"),
    ),
    responses(
        (status = 200, description = "Payout sent", body = TransferResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn claim_payout(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Caller(caller): Caller,
) -> Result<impl IntoResponse, LootpotError> {
    let transfer = state
        .pool_service
        .claim_payout(PoolId::from_uuid(id), &caller)
        .await?;
    Ok(Json(TransferResponse::from(transfer)))
}

/// `GET /users/{address}/history` — Pools an address has joined.
///
/// # Errors
///
/// Returns [`LootpotError::InvalidRequest`] for a malformed address.
#[utoipa::path(
    get,
    path = "/api/v1/users/{address}/history",
    tag = "Participation",
    summary = "User participation history",
    description = "Lists every pool the address has joined, newest first.",
    params(("address" = String, Path, description = "User address")),
    responses(
        (status = 200, description = "History", body = UserHistoryResponse),
        (status = 400, description = "Malformed address", body = ErrorResponse),
    )
)]
pub async fn user_history(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, LootpotError> {
    let address = Address::new(&address)?;
    let entries = state.pool_service.user_history(&address).await;
    Ok(Json(UserHistoryResponse { address, entries }))
}

/// Participation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/join", post(join_pool))
        .route("/pools/{id}/draws", post(request_draw))
        .route(
            "/pools/{id}/draws/{request_id}/fulfill",
            post(fulfill_draw),
        )
        .route("/pools/{id}/participants/{address}", get(get_participant))
        .route("/pools/{id}/claim", post(claim_payout))
        .route("/users/{address}/history", get(user_history))
}
