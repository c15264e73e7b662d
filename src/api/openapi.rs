//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::api::dto;
use crate::api::handlers::{admin, participation, pool, system};
use crate::domain;
use crate::error::{ErrorBody, ErrorKind, ErrorResponse};

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "lootpot", description = "Pooled, time-bounded lottery service"),
    paths(
        pool::create_pool,
        pool::list_pools,
        pool::pool_count,
        pool::pool_by_index,
        pool::is_pool,
        pool::get_pool,
        pool::pool_stats,
        participation::join_pool,
        participation::request_draw,
        participation::fulfill_draw,
        participation::get_participant,
        participation::claim_payout,
        participation::user_history,
        admin::end_pool,
        admin::withdraw_platform_fees,
        admin::emergency_withdraw,
        admin::withdraw_registry_fees,
        admin::registry_fee_balance,
        system::health_handler,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        ErrorKind,
        dto::CreatePoolRequest,
        dto::CreatePoolResponse,
        dto::PoolListResponse,
        dto::PaginationMeta,
        dto::PoolCountResponse,
        dto::PoolAtIndexResponse,
        dto::IsPoolResponse,
        dto::EndPoolResponse,
        dto::DepositRequest,
        dto::FulfillRequest,
        dto::FulfillResponse,
        dto::TransferResponse,
        dto::FeeBalanceResponse,
        dto::UserHistoryResponse,
        domain::PoolEvent,
    )),
    tags(
        (name = "Pools", description = "Pool creation and inspection"),
        (name = "Registry", description = "Registry lookups and creation fees"),
        (name = "Participation", description = "Deposits, draws and payouts"),
        (name = "Lifecycle", description = "Ending pools and owner withdrawals"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
