//! Participant and pending-draw records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Address, Amount};

/// Correlation id of a deferred draw.
pub type RequestId = uuid::Uuid;

/// Settlement state of a participant's draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Outcome applied.
    Settled,
    /// Funds escrowed, waiting for the oracle.
    Pending,
}

/// One participant's entry in a pool ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParticipantRecord {
    /// Participant address; [`Address::ZERO`] for the absent sentinel.
    pub address: Address,
    /// Amount deposited.
    pub amount: Amount,
    /// When the deposit was accepted.
    pub joined_at: DateTime<Utc>,
    /// Whether the draw was won.
    pub has_won: bool,
    /// Prize credited on a win, zero otherwise.
    pub prize_amount: Amount,
    /// Whether the outcome has been applied.
    pub status: EntryStatus,
}

impl ParticipantRecord {
    /// Zero-value record returned for addresses with no entry.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            address: Address::zero(),
            amount: Amount::ZERO,
            joined_at: DateTime::<Utc>::UNIX_EPOCH,
            has_won: false,
            prize_amount: Amount::ZERO,
            status: EntryStatus::Settled,
        }
    }

    /// Returns `true` for the sentinel produced by [`ParticipantRecord::absent`].
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.address.is_zero()
    }
}

/// Lifecycle of a deferred draw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DrawState {
    /// Awaiting fulfillment.
    Pending,
    /// Outcome applied.
    Fulfilled,
    /// Timed out and refunded.
    Voided,
}

/// Ledger entry for one deferred draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PendingDraw {
    /// Correlation id handed to the randomness provider.
    #[schema(value_type = String, format = Uuid)]
    pub request_id: RequestId,
    /// Participant who requested the draw.
    pub participant: Address,
    /// Escrowed deposit.
    pub amount: Amount,
    /// When the request was committed.
    pub requested_at: DateTime<Utc>,
    /// Current state.
    pub state: DrawState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_record_is_zero_valued() {
        let rec = ParticipantRecord::absent();
        assert!(rec.is_absent());
        assert_eq!(rec.amount, Amount::ZERO);
        assert_eq!(rec.prize_amount, Amount::ZERO);
        assert!(!rec.has_won);
    }
}
