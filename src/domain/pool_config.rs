//! Pool parameters and their validation.

use std::num::NonZeroU32;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Amount;
use crate::error::LootpotError;

/// Highest platform fee a pool may charge, in percent.
pub const MAX_PLATFORM_FEE_PERCENT: u8 = 50;

/// Longest accepted pool name.
pub const MAX_POOL_NAME_LEN: usize = 100;

/// Longest accepted pool duration.
pub const MAX_DURATION_DAYS: u32 = 3_650;

/// Creator-supplied parameters for a new pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PoolParams {
    /// Display name.
    pub name: String,
    /// Smallest accepted deposit.
    pub min_participation: Amount,
    /// Win odds are `1 / win_probability_denominator`.
    pub win_probability_denominator: u32,
    /// Share of each deposit retained as platform fee.
    pub platform_fee_percent: u8,
    /// Lifetime of the pool in days.
    pub duration_days: u32,
}

/// Validated configuration of a running pool.
///
/// Every field is fixed at construction except `is_active`, which flips to
/// `false` exactly once when the pool ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PoolConfig {
    /// Display name.
    pub name: String,
    /// Smallest accepted deposit.
    pub min_participation: Amount,
    /// Win odds are `1 / win_probability_denominator`.
    #[schema(value_type = u32)]
    pub win_probability_denominator: NonZeroU32,
    /// Share of each deposit retained as platform fee, `0..=50`.
    pub platform_fee_percent: u8,
    /// When the pool was deployed.
    pub start_time: DateTime<Utc>,
    /// When the pool stops accepting deposits.
    pub end_time: DateTime<Utc>,
    /// `false` once the pool has ended.
    pub is_active: bool,
}

impl PoolConfig {
    /// Validates `params` and derives the lifetime window from `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::InvalidConfig`] if the name is empty or too
    /// long, the fee exceeds [`MAX_PLATFORM_FEE_PERCENT`], the denominator is
    /// zero, or the duration is zero or above [`MAX_DURATION_DAYS`].
    pub fn new(params: PoolParams, now: DateTime<Utc>) -> Result<Self, LootpotError> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(LootpotError::InvalidConfig("name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_POOL_NAME_LEN {
            return Err(LootpotError::InvalidConfig(format!(
                "name longer than {MAX_POOL_NAME_LEN} characters"
            )));
        }
        if params.platform_fee_percent > MAX_PLATFORM_FEE_PERCENT {
            return Err(LootpotError::InvalidConfig(format!(
                "platform fee {}% exceeds {MAX_PLATFORM_FEE_PERCENT}%",
                params.platform_fee_percent
            )));
        }
        let Some(win_probability_denominator) = NonZeroU32::new(params.win_probability_denominator)
        else {
            return Err(LootpotError::InvalidConfig(
                "win probability denominator must be at least 1".to_string(),
            ));
        };
        if params.duration_days == 0 {
            return Err(LootpotError::InvalidConfig("duration must be at least one day".to_string()));
        }
        if params.duration_days > MAX_DURATION_DAYS {
            return Err(LootpotError::InvalidConfig(format!(
                "duration exceeds {MAX_DURATION_DAYS} days"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            min_participation: params.min_participation,
            win_probability_denominator,
            platform_fee_percent: params.platform_fee_percent,
            start_time: now,
            end_time: now + Duration::days(i64::from(params.duration_days)),
            is_active: true,
        })
    }

    /// Returns `true` once `now` has reached the end time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }
}
