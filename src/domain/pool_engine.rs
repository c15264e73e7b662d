//! Per-pool lottery state machine and ledgers.
//!
//! A [`PoolEngine`] owns one pool's configuration, participant ledger, fee
//! ledger, claimable balances and deferred draws. It is a plain synchronous
//! value: the [`PoolRegistry`](super::PoolRegistry) wraps each engine in its
//! own lock so every mutating call on one pool is applied in total order.
//!
//! Every mutating method validates and computes all new ledger values
//! before writing any of them, so a rejected call leaves the engine exactly
//! as it was. Outbound funds are never pushed from inside a draw: prizes and
//! refunds are credited to a claimable balance that the recipient pulls
//! with [`PoolEngine::claim_payout`].

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::oracle::{DrawOutcome, DrawRequest, RandomnessOracle};
use super::participant::{
    DrawState, EntryStatus, ParticipantRecord, PendingDraw, RequestId,
};
use super::{Address, Amount, PoolConfig, PoolId};
use crate::error::LootpotError;

/// Lifecycle state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// Accepting deposits until the end time.
    Active,
    /// Terminal; deposits rejected, residual funds recoverable.
    Ended,
}

/// Funds leaving a ledger, produced only after the ledger is updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Transfer {
    /// Recipient.
    pub to: Address,
    /// Amount sent (may be zero).
    pub amount: Amount,
}

/// Result of a synchronous join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct JoinReceipt {
    /// Participant address.
    pub participant: Address,
    /// Deposited amount.
    pub amount: Amount,
    /// Platform fee retained from the deposit.
    pub fee: Amount,
    /// Draw outcome.
    pub outcome: DrawOutcome,
    /// Prize credited to the participant's claimable balance.
    pub prize_amount: Amount,
    /// Acceptance time.
    pub joined_at: DateTime<Utc>,
}

/// Acknowledgement of a deferred draw request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DrawTicket {
    /// Correlation id to fulfill against.
    #[schema(value_type = String, format = Uuid)]
    pub request_id: RequestId,
    /// Participant address.
    pub participant: Address,
    /// Escrowed amount.
    pub amount: Amount,
    /// Commit time.
    pub requested_at: DateTime<Utc>,
}

/// Outcome applied to a deferred draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Settlement {
    /// Correlation id.
    #[schema(value_type = String, format = Uuid)]
    pub request_id: RequestId,
    /// Participant address.
    pub participant: Address,
    /// Draw outcome.
    pub outcome: DrawOutcome,
    /// Platform fee retained.
    pub fee: Amount,
    /// Prize credited, zero on a loss.
    pub prize_amount: Amount,
}

/// Deferred draw cancelled after timing out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VoidedDraw {
    /// Correlation id.
    #[schema(value_type = String, format = Uuid)]
    pub request_id: RequestId,
    /// Participant refunded.
    pub participant: Address,
    /// Amount credited back.
    pub refunded: Amount,
}

/// Aggregate read model of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PoolStats {
    /// Sum of all recorded participant deposits.
    pub total_prize_pool: Amount,
    /// Number of participant records.
    pub total_participants: usize,
    /// Whether the pool has not been ended.
    pub is_active: bool,
}

/// One lottery pool.
#[derive(Debug)]
pub struct PoolEngine {
    id: PoolId,
    owner: Address,
    config: PoolConfig,
    state: PoolState,
    participants: HashMap<Address, ParticipantRecord>,
    join_order: Vec<Address>,
    total_prize_pool: Amount,
    platform_fee_collected: Amount,
    balance: Amount,
    claimable: HashMap<Address, Amount>,
    claimable_total: Amount,
    draws: HashMap<RequestId, PendingDraw>,
    escrowed: Amount,
}

impl PoolEngine {
    /// Creates an active pool owned by `owner`.
    #[must_use]
    pub fn new(id: PoolId, owner: Address, config: PoolConfig) -> Self {
        Self {
            id,
            owner,
            config,
            state: PoolState::Active,
            participants: HashMap::new(),
            join_order: Vec::new(),
            total_prize_pool: Amount::ZERO,
            platform_fee_collected: Amount::ZERO,
            balance: Amount::ZERO,
            claimable: HashMap::new(),
            claimable_total: Amount::ZERO,
            draws: HashMap::new(),
            escrowed: Amount::ZERO,
        }
    }

    /// Pool address.
    #[must_use]
    pub const fn id(&self) -> PoolId {
        self.id
    }

    /// Pool owner (the creator).
    #[must_use]
    pub const fn owner(&self) -> &Address {
        &self.owner
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PoolState {
        self.state
    }

    /// Number of participant records, pending ones included.
    #[must_use]
    pub fn total_participants(&self) -> usize {
        self.participants.len()
    }

    /// Sum of recorded deposits.
    #[must_use]
    pub const fn total_prize_pool(&self) -> Amount {
        self.total_prize_pool
    }

    /// Platform fees awaiting withdrawal.
    #[must_use]
    pub const fn platform_fee_collected(&self) -> Amount {
        self.platform_fee_collected
    }

    /// Funds currently held by the pool.
    #[must_use]
    pub const fn balance(&self) -> Amount {
        self.balance
    }

    /// Funds credited to `address` and not yet claimed.
    #[must_use]
    pub fn claimable_of(&self, address: &Address) -> Amount {
        self.claimable.get(address).copied().unwrap_or_default()
    }

    /// Funds held but owed to nobody: neither fees, claimable credits nor
    /// escrow.
    #[must_use]
    pub fn residual_balance(&self) -> Amount {
        self.balance
            .saturating_sub(self.platform_fee_collected)
            .saturating_sub(self.claimable_total)
            .saturating_sub(self.escrowed)
    }

    /// Returns the record for `address`, or [`ParticipantRecord::absent`].
    #[must_use]
    pub fn participant(&self, address: &Address) -> ParticipantRecord {
        self.participants
            .get(address)
            .cloned()
            .unwrap_or_else(ParticipantRecord::absent)
    }

    /// Participant records in join order.
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantRecord> {
        self.join_order
            .iter()
            .filter_map(|address| self.participants.get(address))
    }

    /// Looks up a deferred draw.
    #[must_use]
    pub fn draw(&self, request_id: &RequestId) -> Option<&PendingDraw> {
        self.draws.get(request_id)
    }

    /// Number of deferred draws still awaiting fulfillment.
    #[must_use]
    pub fn pending_draw_count(&self) -> usize {
        self.draws
            .values()
            .filter(|d| d.state == DrawState::Pending)
            .count()
    }

    /// `(total_prize_pool, total_participants, is_active)`.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_prize_pool: self.total_prize_pool,
            total_participants: self.participants.len(),
            is_active: self.config.is_active,
        }
    }

    /// Returns `true` if the pool would accept a deposit at `now`.
    #[must_use]
    pub fn accepts_deposits(&self, now: DateTime<Utc>) -> bool {
        self.state == PoolState::Active && !self.config.is_expired(now)
    }

    fn check_join(
        &self,
        participant: &Address,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<(), LootpotError> {
        if !self.accepts_deposits(now) {
            return Err(LootpotError::InactivePool(self.id));
        }
        if amount < self.config.min_participation {
            return Err(LootpotError::BelowMinimum {
                amount,
                minimum: self.config.min_participation,
            });
        }
        if self.participants.contains_key(participant) {
            return Err(LootpotError::DuplicateParticipant(participant.clone()));
        }
        Ok(())
    }

    /// Splits a deposit into `(fee, prize)` for the given outcome.
    fn price_outcome(
        &self,
        amount: Amount,
        outcome: DrawOutcome,
    ) -> Result<(Amount, Amount), LootpotError> {
        let fee = amount.percent(self.config.platform_fee_percent)?;
        let prize = if outcome.is_win() {
            amount.checked_sub(fee)?
        } else {
            Amount::ZERO
        };
        Ok((fee, prize))
    }

    /// Deposits `amount` for `participant` and settles the draw immediately.
    ///
    /// The oracle is consulted after every precondition passes and before
    /// any field is written, so an oracle failure leaves the pool untouched.
    ///
    /// # Errors
    ///
    /// - [`LootpotError::InactivePool`] if the pool ended or expired.
    /// - [`LootpotError::BelowMinimum`] if `amount` is below the minimum.
    /// - [`LootpotError::DuplicateParticipant`] if `participant` already
    ///   has a record.
    /// - [`LootpotError::OracleUnavailable`] if the oracle cannot answer.
    /// - [`LootpotError::Overflow`] on ledger overflow.
    pub fn join_pool(
        &mut self,
        participant: Address,
        amount: Amount,
        now: DateTime<Utc>,
        oracle: &dyn RandomnessOracle,
    ) -> Result<JoinReceipt, LootpotError> {
        self.check_join(&participant, amount, now)?;

        let outcome = oracle.draw(&DrawRequest {
            pool_id: self.id,
            participant: participant.clone(),
            amount,
            denominator: self.config.win_probability_denominator,
        })?;

        let (fee, prize) = self.price_outcome(amount, outcome)?;
        let total_prize_pool = self.total_prize_pool.checked_add(amount)?;
        let balance = self.balance.checked_add(amount)?;
        let platform_fee_collected = self.platform_fee_collected.checked_add(fee)?;
        let claimable = self.claimable_of(&participant).checked_add(prize)?;
        let claimable_total = self.claimable_total.checked_add(prize)?;

        self.total_prize_pool = total_prize_pool;
        self.balance = balance;
        self.platform_fee_collected = platform_fee_collected;
        self.participants.insert(
            participant.clone(),
            ParticipantRecord {
                address: participant.clone(),
                amount,
                joined_at: now,
                has_won: outcome.is_win(),
                prize_amount: prize,
                status: EntryStatus::Settled,
            },
        );
        self.join_order.push(participant.clone());
        if !prize.is_zero() {
            self.claimable.insert(participant.clone(), claimable);
            self.claimable_total = claimable_total;
        }

        Ok(JoinReceipt {
            participant,
            amount,
            fee,
            outcome,
            prize_amount: prize,
            joined_at: now,
        })
    }

    /// Request phase of a deferred draw: escrows the deposit and records the
    /// participant as pending.
    ///
    /// # Errors
    ///
    /// Same precondition errors as [`PoolEngine::join_pool`], plus
    /// [`LootpotError::Overflow`].
    pub fn request_join(
        &mut self,
        participant: Address,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<DrawTicket, LootpotError> {
        self.check_join(&participant, amount, now)?;

        let total_prize_pool = self.total_prize_pool.checked_add(amount)?;
        let balance = self.balance.checked_add(amount)?;
        let escrowed = self.escrowed.checked_add(amount)?;

        let mut request_id = uuid::Uuid::new_v4();
        while self.draws.contains_key(&request_id) {
            request_id = uuid::Uuid::new_v4();
        }

        self.total_prize_pool = total_prize_pool;
        self.balance = balance;
        self.escrowed = escrowed;
        self.participants.insert(
            participant.clone(),
            ParticipantRecord {
                address: participant.clone(),
                amount,
                joined_at: now,
                has_won: false,
                prize_amount: Amount::ZERO,
                status: EntryStatus::Pending,
            },
        );
        self.join_order.push(participant.clone());
        self.draws.insert(
            request_id,
            PendingDraw {
                request_id,
                participant: participant.clone(),
                amount,
                requested_at: now,
                state: DrawState::Pending,
            },
        );

        Ok(DrawTicket {
            request_id,
            participant,
            amount,
            requested_at: now,
        })
    }

    /// Fulfill phase of a deferred draw.
    ///
    /// Returns `Ok(None)` without touching anything when `request_id` is
    /// unknown, already fulfilled or voided.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Overflow`] on ledger overflow.
    pub fn fulfill_draw(
        &mut self,
        request_id: RequestId,
        random_word: u64,
    ) -> Result<Option<Settlement>, LootpotError> {
        let Some(draw) = self.draws.get(&request_id) else {
            return Ok(None);
        };
        if draw.state != DrawState::Pending {
            return Ok(None);
        }
        let participant = draw.participant.clone();
        let amount = draw.amount;

        let outcome =
            DrawOutcome::from_random_word(random_word, self.config.win_probability_denominator);
        let (fee, prize) = self.price_outcome(amount, outcome)?;
        let platform_fee_collected = self.platform_fee_collected.checked_add(fee)?;
        let escrowed = self.escrowed.checked_sub(amount)?;
        let claimable = self.claimable_of(&participant).checked_add(prize)?;
        let claimable_total = self.claimable_total.checked_add(prize)?;

        self.platform_fee_collected = platform_fee_collected;
        self.escrowed = escrowed;
        if let Some(record) = self.participants.get_mut(&participant) {
            record.has_won = outcome.is_win();
            record.prize_amount = prize;
            record.status = EntryStatus::Settled;
        }
        if let Some(draw) = self.draws.get_mut(&request_id) {
            draw.state = DrawState::Fulfilled;
        }
        if !prize.is_zero() {
            self.claimable.insert(participant.clone(), claimable);
            self.claimable_total = claimable_total;
        }

        Ok(Some(Settlement {
            request_id,
            participant,
            outcome,
            fee,
            prize_amount: prize,
        }))
    }

    /// Voids every pending draw committed at least `timeout` before `now`,
    /// refunding the escrow to the participant's claimable balance and
    /// removing their record so the address may join again.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Overflow`] on ledger overflow; nothing is
    /// voided in that case.
    pub fn void_expired(
        &mut self,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Vec<VoidedDraw>, LootpotError> {
        let mut expired: Vec<&PendingDraw> = self
            .draws
            .values()
            .filter(|d| d.state == DrawState::Pending && now - d.requested_at >= timeout)
            .collect();
        if expired.is_empty() {
            return Ok(Vec::new());
        }
        expired.sort_by_key(|d| d.requested_at);

        let mut total_prize_pool = self.total_prize_pool;
        let mut escrowed = self.escrowed;
        let mut claimable_total = self.claimable_total;
        let mut refunds: HashMap<Address, Amount> = HashMap::new();
        let mut voided = Vec::with_capacity(expired.len());
        for draw in expired {
            total_prize_pool = total_prize_pool.checked_sub(draw.amount)?;
            escrowed = escrowed.checked_sub(draw.amount)?;
            claimable_total = claimable_total.checked_add(draw.amount)?;
            let credit = refunds
                .get(&draw.participant)
                .copied()
                .unwrap_or_else(|| self.claimable_of(&draw.participant))
                .checked_add(draw.amount)?;
            refunds.insert(draw.participant.clone(), credit);
            voided.push(VoidedDraw {
                request_id: draw.request_id,
                participant: draw.participant.clone(),
                refunded: draw.amount,
            });
        }

        self.total_prize_pool = total_prize_pool;
        self.escrowed = escrowed;
        self.claimable_total = claimable_total;
        self.claimable.extend(refunds);
        for v in &voided {
            if let Some(draw) = self.draws.get_mut(&v.request_id) {
                draw.state = DrawState::Voided;
            }
            self.participants.remove(&v.participant);
            self.join_order.retain(|a| a != &v.participant);
        }

        Ok(voided)
    }

    /// Moves the pool to [`PoolState::Ended`].
    ///
    /// # Errors
    ///
    /// - [`LootpotError::AlreadyEnded`] if already ended.
    /// - [`LootpotError::NotYetExpired`] if `now` is before the end time.
    pub fn end_pool(&mut self, now: DateTime<Utc>) -> Result<DateTime<Utc>, LootpotError> {
        if self.state == PoolState::Ended {
            return Err(LootpotError::AlreadyEnded);
        }
        if !self.config.is_expired(now) {
            return Err(LootpotError::NotYetExpired {
                end_time: self.config.end_time,
            });
        }
        self.state = PoolState::Ended;
        self.config.is_active = false;
        Ok(now)
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), LootpotError> {
        if caller != &self.owner {
            return Err(LootpotError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    /// Sends all collected platform fees to the owner. Allowed in any state.
    ///
    /// # Errors
    ///
    /// - [`LootpotError::Unauthorized`] if `caller` is not the owner.
    /// - [`LootpotError::Overflow`] if the fee ledger exceeds the balance.
    pub fn withdraw_platform_fees(&mut self, caller: &Address) -> Result<Transfer, LootpotError> {
        self.ensure_owner(caller)?;
        let amount = self.platform_fee_collected;
        let balance = self.balance.checked_sub(amount)?;

        self.balance = balance;
        self.platform_fee_collected = Amount::ZERO;

        Ok(Transfer {
            to: self.owner.clone(),
            amount,
        })
    }

    /// Sends the residual balance of an ended pool to the owner.
    ///
    /// Fees, unclaimed prizes and refunds, and escrow of pending draws stay
    /// in the pool.
    ///
    /// # Errors
    ///
    /// - [`LootpotError::Unauthorized`] if `caller` is not the owner.
    /// - [`LootpotError::StillActive`] if the pool has not ended.
    pub fn emergency_withdraw(&mut self, caller: &Address) -> Result<Transfer, LootpotError> {
        self.ensure_owner(caller)?;
        if self.state != PoolState::Ended {
            return Err(LootpotError::StillActive);
        }
        let amount = self.residual_balance();
        self.balance = self.balance.checked_sub(amount)?;

        Ok(Transfer {
            to: self.owner.clone(),
            amount,
        })
    }

    /// Pays out everything credited to `caller`. A caller with nothing owed
    /// receives a zero transfer.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Overflow`] if the ledger is inconsistent.
    pub fn claim_payout(&mut self, caller: &Address) -> Result<Transfer, LootpotError> {
        let amount = self.claimable_of(caller);
        let balance = self.balance.checked_sub(amount)?;
        let claimable_total = self.claimable_total.checked_sub(amount)?;

        self.balance = balance;
        self.claimable_total = claimable_total;
        self.claimable.remove(caller);

        Ok(Transfer {
            to: caller.clone(),
            amount,
        })
    }
}
