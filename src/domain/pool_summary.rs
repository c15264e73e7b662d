//! Read models derived from a [`PoolEngine`] for list and detail views.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Address, Amount, PoolConfig, PoolEngine, PoolId, PoolState, PoolStats};

/// Lightweight summary of a pool for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolSummary {
    /// Pool address.
    pub pool_id: PoolId,
    /// Pool name.
    pub name: String,
    /// Minimum deposit.
    pub min_participation: Amount,
    /// Win odds denominator.
    pub win_probability_denominator: u32,
    /// Sum of deposits.
    pub total_prize_pool: Amount,
    /// Number of participants.
    pub total_participants: usize,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    /// Whether the pool has not been ended.
    pub is_active: bool,
}

impl From<&PoolEngine> for PoolSummary {
    fn from(engine: &PoolEngine) -> Self {
        let config = engine.config();
        Self {
            pool_id: engine.id(),
            name: config.name.clone(),
            min_participation: config.min_participation,
            win_probability_denominator: config.win_probability_denominator.get(),
            total_prize_pool: engine.total_prize_pool(),
            total_participants: engine.total_participants(),
            end_time: config.end_time,
            is_active: config.is_active,
        }
    }
}

/// Full view of one pool.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolDetail {
    /// Pool address.
    pub pool_id: PoolId,
    /// Pool owner.
    pub owner: Address,
    /// Configuration.
    pub config: PoolConfig,
    /// Lifecycle state.
    pub state: PoolState,
    /// `(total_prize_pool, total_participants, is_active)`.
    pub stats: PoolStats,
    /// Fees awaiting withdrawal.
    pub platform_fee_collected: Amount,
    /// Funds held by the pool.
    pub balance: Amount,
    /// Funds recoverable by emergency withdrawal once ended.
    pub residual_balance: Amount,
    /// Deferred draws awaiting fulfillment.
    pub pending_draws: usize,
}

impl From<&PoolEngine> for PoolDetail {
    fn from(engine: &PoolEngine) -> Self {
        Self {
            pool_id: engine.id(),
            owner: engine.owner().clone(),
            config: engine.config().clone(),
            state: engine.state(),
            stats: engine.stats(),
            platform_fee_collected: engine.platform_fee_collected(),
            balance: engine.balance(),
            residual_balance: engine.residual_balance(),
            pending_draws: engine.pending_draw_count(),
        }
    }
}

/// One pool an address has taken part in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipationHistory {
    /// Pool address.
    pub pool_id: PoolId,
    /// Pool name.
    pub pool_name: String,
    /// Deposited amount.
    pub amount: Amount,
    /// When the deposit was accepted.
    pub joined_at: DateTime<Utc>,
    /// Whether the draw was won.
    pub has_won: bool,
    /// Prize credited.
    pub prize_amount: Amount,
    /// Prize or refund still waiting to be claimed.
    pub claimable: Amount,
}

impl ParticipationHistory {
    /// Builds the history row for `address` in `engine`, or `None` if the
    /// address never joined.
    #[must_use]
    pub fn for_address(engine: &PoolEngine, address: &Address) -> Option<Self> {
        let record = engine.participant(address);
        if record.is_absent() {
            return None;
        }
        Some(Self {
            pool_id: engine.id(),
            pool_name: engine.config().name.clone(),
            amount: record.amount,
            joined_at: record.joined_at,
            has_won: record.has_won,
            prize_amount: record.prize_amount,
            claimable: engine.claimable_of(address),
        })
    }
}
