//! Pool and registry handlers: create, list, lookups, detail, stats.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreatePoolRequest, CreatePoolResponse, IsPoolResponse, PaginationParams, PoolAtIndexResponse,
    PoolCountResponse, PoolListResponse,
};
use crate::api::extractors::Caller;
use crate::app_state::AppState;
use crate::domain::{PoolDetail, PoolId, PoolStats};
use crate::error::{ErrorResponse, LootpotError};

/// `POST /pools` — Deploy a new lottery pool.
///
/// # Errors
///
/// Returns [`LootpotError::InsufficientFee`] when the attached fee is below
/// the registry's creation fee, or [`LootpotError::InvalidConfig`].
#[utoipa::path(
    post,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "Create a pool",
    description = "Deploys a pool owned by the caller. The attached creation fee must cover the registry fee; the whole amount is kept by the registry.",
    request_body = CreatePoolRequest,
    params(("x-caller-address" = String, Header, description = "Caller address")),
    responses(
        (status = 201, description = "Pool created", body = CreatePoolResponse),
        (status = 400, description = "Invalid configuration", body = ErrorResponse),
        (status = 402, description = "Creation fee too low", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    Caller(creator): Caller,
    Json(req): Json<CreatePoolRequest>,
) -> Result<impl IntoResponse, LootpotError> {
    let (params, paid_fee) = req.into_parts();
    let pool_id = state
        .pool_service
        .create_pool(creator.clone(), params, paid_fee)
        .await?;

    let response = CreatePoolResponse {
        pool_id,
        owner: creator,
        created_at: state.pool_service.now(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /pools` — List pools with pagination, in creation order.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns a paginated list of pool summaries in creation order.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated pool list", body = PoolListResponse),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let params = params.clamped();
    let summaries = state.pool_service.list_pools().await;
    let pagination = params.meta(summaries.len());

    let data = summaries
        .into_iter()
        .skip(params.offset())
        .take(params.per_page as usize)
        .collect();

    Json(PoolListResponse { data, pagination })
}

/// `GET /pools/count` — Number of pools ever created.
#[utoipa::path(
    get,
    path = "/api/v1/pools/count",
    tag = "Registry",
    summary = "Count pools",
    responses(
        (status = 200, description = "Pool count", body = PoolCountResponse),
    )
)]
pub async fn pool_count(State(state): State<AppState>) -> impl IntoResponse {
    Json(PoolCountResponse {
        count: state.pool_service.pool_count().await,
    })
}

/// `GET /pools/index/{index}` — Pool at a creation-order position.
///
/// # Errors
///
/// Returns [`LootpotError::IndexOutOfRange`] past the end.
#[utoipa::path(
    get,
    path = "/api/v1/pools/index/{index}",
    tag = "Registry",
    summary = "Pool by index",
    params(("index" = usize, Path, description = "Zero-based creation index")),
    responses(
        (status = 200, description = "Pool address", body = PoolAtIndexResponse),
        (status = 404, description = "Index out of range", body = ErrorResponse),
    )
)]
pub async fn pool_by_index(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, LootpotError> {
    let pool_id = state.pool_service.pool_by_index(index).await?;
    Ok(Json(PoolAtIndexResponse { index, pool_id }))
}

/// `GET /pools/{id}/is-pool` — Whether an address is a registry pool.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/is-pool",
    tag = "Registry",
    summary = "Check pool membership",
    params(("id" = uuid::Uuid, Path, description = "Pool address")),
    responses(
        (status = 200, description = "Membership flag", body = IsPoolResponse),
    )
)]
pub async fn is_pool(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let pool_id = PoolId::from_uuid(id);
    Json(IsPoolResponse {
        pool_id,
        is_pool: state.pool_service.is_pool(pool_id).await,
    })
}

/// `GET /pools/{id}` — Full pool detail.
///
/// # Errors
///
/// Returns [`LootpotError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Get pool details",
    description = "Returns configuration, lifecycle state, balances and pending draw count.",
    params(("id" = uuid::Uuid, Path, description = "Pool address")),
    responses(
        (status = 200, description = "Pool details", body = PoolDetail),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LootpotError> {
    let detail = state
        .pool_service
        .pool_detail(PoolId::from_uuid(id))
        .await?;
    Ok(Json(detail))
}

/// `GET /pools/{id}/stats` — `(total_prize_pool, total_participants, is_active)`.
///
/// # Errors
///
/// Returns [`LootpotError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/stats",
    tag = "Pools",
    summary = "Get pool stats",
    params(("id" = uuid::Uuid, Path, description = "Pool address")),
    responses(
        (status = 200, description = "Pool stats", body = PoolStats),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn pool_stats(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LootpotError> {
    let detail = state
        .pool_service
        .pool_detail(PoolId::from_uuid(id))
        .await?;
    Ok(Json(detail.stats))
}

/// Pool and registry lookup routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools", post(create_pool).get(list_pools))
        .route("/pools/count", get(pool_count))
        .route("/pools/index/{index}", get(pool_by_index))
        .route("/pools/{id}", get(get_pool))
        .route("/pools/{id}/is-pool", get(is_pool))
        .route("/pools/{id}/stats", get(pool_stats))
}
