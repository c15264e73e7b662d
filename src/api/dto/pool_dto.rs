//! Pool DTOs: creation, listing and registry lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{Address, Amount, PoolId, PoolParams, PoolSummary};

/// Request body for `POST /pools`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePoolRequest {
    /// Pool name (1 to 100 chars).
    pub name: String,
    /// Minimum deposit.
    pub min_participation: Amount,
    /// Win odds are `1 / win_probability_denominator`.
    pub win_probability_denominator: u32,
    /// Percent of every deposit kept as platform fee (0 to 50).
    pub platform_fee_percent: u8,
    /// Lifetime in days.
    pub duration_days: u32,
    /// Creation fee attached to the call.
    pub paid_fee: Amount,
}

impl CreatePoolRequest {
    /// Splits the request into pool parameters and the attached fee.
    #[must_use]
    pub fn into_parts(self) -> (PoolParams, Amount) {
        let params = PoolParams {
            name: self.name,
            min_participation: self.min_participation,
            win_probability_denominator: self.win_probability_denominator,
            platform_fee_percent: self.platform_fee_percent,
            duration_days: self.duration_days,
        };
        (params, self.paid_fee)
    }
}

/// Response body for `POST /pools` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePoolResponse {
    /// Address of the new pool.
    pub pool_id: PoolId,
    /// Pool owner.
    pub owner: Address,
    /// Server creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Paginated list response for `GET /pools`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolListResponse {
    /// Pool summaries in creation order.
    pub data: Vec<PoolSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `GET /pools/count`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolCountResponse {
    /// Number of pools ever created.
    pub count: usize,
}

/// Response body for `GET /pools/index/{index}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolAtIndexResponse {
    /// Requested position.
    pub index: usize,
    /// Pool at that position.
    pub pool_id: PoolId,
}

/// Response body for `GET /pools/{id}/is-pool`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IsPoolResponse {
    /// Queried address.
    pub pool_id: PoolId,
    /// Whether the registry created it.
    pub is_pool: bool,
}

/// Response body for `POST /pools/{id}/end`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EndPoolResponse {
    /// Ended pool.
    pub pool_id: PoolId,
    /// Time the pool was ended.
    pub ended_at: DateTime<Utc>,
}
