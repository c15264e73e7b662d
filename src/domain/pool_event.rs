//! Domain events reflecting registry and pool state changes.
//!
//! Every successful mutation emits a [`PoolEvent`] through the
//! [`super::EventBus`]. Events are streamed to WebSocket subscribers and
//! optionally appended to the PostgreSQL event log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::participant::RequestId;
use super::{Address, Amount, PoolId};

/// Domain event emitted after a committed mutation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A pool was deployed by the registry.
    PoolCreated {
        /// New pool address.
        pool_id: PoolId,
        /// Pool name.
        name: String,
        /// Minimum deposit.
        min_participation: Amount,
        /// Creator and owner.
        creator: Address,
        /// Creation time.
        timestamp: DateTime<Utc>,
    },

    /// A deposit was accepted.
    ParticipantJoined {
        /// Pool address.
        pool_id: PoolId,
        /// Participant.
        address: Address,
        /// Deposited amount.
        amount: Amount,
        /// Acceptance time.
        timestamp: DateTime<Utc>,
    },

    /// A deferred draw was committed and awaits fulfillment.
    DrawRequested {
        /// Pool address.
        pool_id: PoolId,
        /// Correlation id.
        #[schema(value_type = String, format = Uuid)]
        request_id: RequestId,
        /// Participant.
        address: Address,
        /// Escrowed amount.
        amount: Amount,
        /// Commit time.
        timestamp: DateTime<Utc>,
    },

    /// A draw outcome was applied.
    OutcomeSettled {
        /// Pool address.
        pool_id: PoolId,
        /// Participant.
        address: Address,
        /// Whether the draw was won.
        has_won: bool,
        /// Prize credited.
        prize_amount: Amount,
        /// Settlement time.
        timestamp: DateTime<Utc>,
    },

    /// A deferred draw timed out and was refunded.
    DrawVoided {
        /// Pool address.
        pool_id: PoolId,
        /// Correlation id.
        #[schema(value_type = String, format = Uuid)]
        request_id: RequestId,
        /// Participant refunded.
        address: Address,
        /// Amount credited back.
        refunded: Amount,
        /// Void time.
        timestamp: DateTime<Utc>,
    },

    /// The pool moved to its terminal state.
    PoolEnded {
        /// Pool address.
        pool_id: PoolId,
        /// End time.
        timestamp: DateTime<Utc>,
    },

    /// Platform fees were sent to the pool owner.
    FeesWithdrawn {
        /// Pool address.
        pool_id: PoolId,
        /// Amount sent.
        amount: Amount,
        /// Withdrawal time.
        timestamp: DateTime<Utc>,
    },

    /// Residual funds of an ended pool were recovered by the owner.
    EmergencyWithdrawn {
        /// Pool address.
        pool_id: PoolId,
        /// Amount recovered.
        amount: Amount,
        /// Withdrawal time.
        timestamp: DateTime<Utc>,
    },

    /// A participant pulled their prize or refund.
    PayoutClaimed {
        /// Pool address.
        pool_id: PoolId,
        /// Recipient.
        address: Address,
        /// Amount sent.
        amount: Amount,
        /// Claim time.
        timestamp: DateTime<Utc>,
    },

    /// Creation fees were sent to the registry owner.
    RegistryFeesWithdrawn {
        /// Amount sent.
        amount: Amount,
        /// Withdrawal time.
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Returns the pool this event concerns, `None` for registry-level
    /// events.
    #[must_use]
    pub fn pool_id(&self) -> Option<PoolId> {
        match self {
            Self::PoolCreated { pool_id, .. }
            | Self::ParticipantJoined { pool_id, .. }
            | Self::DrawRequested { pool_id, .. }
            | Self::OutcomeSettled { pool_id, .. }
            | Self::DrawVoided { pool_id, .. }
            | Self::PoolEnded { pool_id, .. }
            | Self::FeesWithdrawn { pool_id, .. }
            | Self::EmergencyWithdrawn { pool_id, .. }
            | Self::PayoutClaimed { pool_id, .. } => Some(*pool_id),
            Self::RegistryFeesWithdrawn { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PoolCreated { .. } => "pool_created",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::DrawRequested { .. } => "draw_requested",
            Self::OutcomeSettled { .. } => "outcome_settled",
            Self::DrawVoided { .. } => "draw_voided",
            Self::PoolEnded { .. } => "pool_ended",
            Self::FeesWithdrawn { .. } => "fees_withdrawn",
            Self::EmergencyWithdrawn { .. } => "emergency_withdrawn",
            Self::PayoutClaimed { .. } => "payout_claimed",
            Self::RegistryFeesWithdrawn { .. } => "registry_fees_withdrawn",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matches_event_type_str() {
        let event = PoolEvent::OutcomeSettled {
            pool_id: PoolId::new(),
            address: Address::zero(),
            has_won: true,
            prize_amount: Amount::new(80),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(
            json.get("event_type").and_then(|v| v.as_str()),
            Some(event.event_type_str())
        );
        assert_eq!(json.get("prize_amount").and_then(|v| v.as_str()), Some("80"));
    }

    #[test]
    fn registry_events_have_no_pool() {
        let event = PoolEvent::RegistryFeesWithdrawn {
            amount: Amount::ZERO,
            timestamp: Utc::now(),
        };
        assert_eq!(event.pool_id(), None);
    }

    #[test]
    fn pool_events_carry_their_pool() {
        let id = PoolId::new();
        let event = PoolEvent::PoolEnded {
            pool_id: id,
            timestamp: Utc::now(),
        };
        assert_eq!(event.pool_id(), Some(id));
    }
}
