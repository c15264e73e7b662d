//! Participation DTOs: deposits, deferred draws, balances and history.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Address, Amount, ParticipationHistory, RequestId, Settlement};

/// Request body for `POST /pools/{id}/join` and `POST /pools/{id}/draws`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Attached value.
    pub amount: Amount,
}

/// Request body for `POST /pools/{id}/draws/{request_id}/fulfill`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FulfillRequest {
    /// Random word delivered by the provider.
    pub random_word: u64,
}

/// Response body for a fulfillment.
///
/// `applied` is `false` when the request id was unknown or already settled;
/// nothing changed in that case.
#[derive(Debug, Serialize, ToSchema)]
pub struct FulfillResponse {
    /// Request that was fulfilled.
    #[schema(value_type = String, format = Uuid)]
    pub request_id: RequestId,
    /// Whether the pool state changed.
    pub applied: bool,
    /// Outcome, when applied.
    pub settlement: Option<Settlement>,
}

/// Response body for `GET /registry/fees`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeeBalanceResponse {
    /// Creation fees awaiting withdrawal.
    pub fee_balance: Amount,
}

/// Response body for `GET /users/{address}/history`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserHistoryResponse {
    /// Queried address.
    pub address: Address,
    /// Pools joined, newest first.
    pub entries: Vec<ParticipationHistory>,
}
