//! Pool service: orchestrates registry, engines and oracle, and emits events.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    Address, Amount, Clock, DrawTicket, EventBus, JoinReceipt, ParticipantRecord,
    ParticipationHistory, PoolDetail, PoolEvent, PoolId, PoolParams, PoolRegistry, PoolSummary,
    RandomnessOracle, RequestId, Settlement, SettlementMode, Transfer, VoidedDraw,
};
use crate::error::LootpotError;

/// Orchestration layer for all lottery operations.
///
/// Owns shared references to the [`PoolRegistry`], the injected
/// [`RandomnessOracle`] and [`Clock`], and the [`EventBus`]. Every mutation
/// follows the same pattern: take the pool's write lock → apply the engine
/// operation → release the lock → emit events → return the result. Events
/// are only published for committed changes.
#[derive(Debug, Clone)]
pub struct PoolService {
    registry: Arc<PoolRegistry>,
    oracle: Arc<dyn RandomnessOracle>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    draw_timeout: Duration,
    mode: SettlementMode,
    randomness_provider: Address,
}

impl PoolService {
    /// Creates a new `PoolService`.
    #[must_use]
    pub fn new(
        registry: Arc<PoolRegistry>,
        oracle: Arc<dyn RandomnessOracle>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        draw_timeout: Duration,
    ) -> Self {
        let randomness_provider = registry.owner().clone();
        Self {
            registry,
            oracle,
            clock,
            event_bus,
            draw_timeout,
            mode: SettlementMode::Sync,
            randomness_provider,
        }
    }

    /// Selects how joins are settled. Defaults to [`SettlementMode::Sync`].
    #[must_use]
    pub fn with_mode(mut self, mode: SettlementMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the only address allowed to fulfill deferred draws. Defaults to
    /// the registry owner.
    #[must_use]
    pub fn with_randomness_provider(mut self, provider: Address) -> Self {
        self.randomness_provider = provider;
        self
    }

    /// Address allowed to fulfill deferred draws.
    #[must_use]
    pub const fn randomness_provider(&self) -> &Address {
        &self.randomness_provider
    }

    /// The configured settlement mode.
    #[must_use]
    pub const fn mode(&self) -> SettlementMode {
        self.mode
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`PoolRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// Current time according to the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// How long a deferred draw may stay pending.
    #[must_use]
    pub const fn draw_timeout(&self) -> Duration {
        self.draw_timeout
    }

    // ── Registry ────────────────────────────────────────────────────────

    /// Deploys a new pool owned by `creator`.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::InsufficientFee`] or
    /// [`LootpotError::InvalidConfig`] from the registry.
    pub async fn create_pool(
        &self,
        creator: Address,
        params: PoolParams,
        paid_fee: Amount,
    ) -> Result<PoolId, LootpotError> {
        let now = self.clock.now();
        let name = params.name.trim().to_string();
        let min_participation = params.min_participation;

        let pool_id = self
            .registry
            .create_pool(creator.clone(), params, paid_fee, now)
            .await
            .inspect_err(|e| tracing::info!(%creator, error = %e, "pool creation rejected"))?;

        tracing::info!(%pool_id, %creator, name = %name, "pool created");
        let _ = self.event_bus.publish(PoolEvent::PoolCreated {
            pool_id,
            name,
            min_participation,
            creator,
            timestamp: now,
        });
        Ok(pool_id)
    }

    /// Sends collected creation fees to the registry owner.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Unauthorized`] for any caller but the owner.
    pub async fn withdraw_registry_fees(&self, caller: &Address) -> Result<Transfer, LootpotError> {
        let transfer = self.registry.withdraw_fees(caller).await?;
        tracing::info!(amount = %transfer.amount, "registry fees withdrawn");
        let _ = self.event_bus.publish(PoolEvent::RegistryFeesWithdrawn {
            amount: transfer.amount,
            timestamp: self.clock.now(),
        });
        Ok(transfer)
    }

    /// Creation fees awaiting withdrawal.
    pub async fn registry_fee_balance(&self) -> Amount {
        self.registry.fee_balance().await
    }

    /// Number of registered pools.
    pub async fn pool_count(&self) -> usize {
        self.registry.pool_count().await
    }

    /// Address of the `index`-th pool.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::IndexOutOfRange`] past the end.
    pub async fn pool_by_index(&self, index: usize) -> Result<PoolId, LootpotError> {
        self.registry.pool_by_index(index).await
    }

    /// Whether `pool_id` was created by this registry.
    pub async fn is_pool(&self, pool_id: PoolId) -> bool {
        self.registry.is_pool(pool_id).await
    }

    /// All pool addresses in creation order.
    pub async fn all_pools(&self) -> Vec<PoolId> {
        self.registry.all_pools().await
    }

    // ── Participation ───────────────────────────────────────────────────

    /// Deposits and settles the draw in one call.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::InvalidRequest`] in deferred mode,
    /// [`LootpotError::PoolNotFound`], or any error of
    /// [`crate::domain::PoolEngine::join_pool`]; the pool is unchanged on
    /// error.
    pub async fn join_pool(
        &self,
        pool_id: PoolId,
        participant: Address,
        amount: Amount,
    ) -> Result<JoinReceipt, LootpotError> {
        self.require_mode(SettlementMode::Sync)?;
        let handle = self.registry.get(pool_id).await?;
        let mut engine = handle.write().await;
        let now = self.clock.now();

        let receipt = match engine.join_pool(participant.clone(), amount, now, self.oracle.as_ref())
        {
            Ok(receipt) => receipt,
            Err(e @ LootpotError::OracleUnavailable(_)) => {
                tracing::warn!(%pool_id, %participant, error = %e, "draw aborted, oracle unavailable");
                return Err(e);
            }
            Err(e) => {
                tracing::debug!(%pool_id, %participant, error = %e, "join rejected");
                return Err(e);
            }
        };
        drop(engine);

        tracing::info!(
            %pool_id,
            participant = %receipt.participant,
            amount = %receipt.amount,
            won = receipt.outcome.is_win(),
            "participant joined"
        );
        let _ = self.event_bus.publish(PoolEvent::ParticipantJoined {
            pool_id,
            address: receipt.participant.clone(),
            amount: receipt.amount,
            timestamp: now,
        });
        let _ = self.event_bus.publish(PoolEvent::OutcomeSettled {
            pool_id,
            address: receipt.participant.clone(),
            has_won: receipt.outcome.is_win(),
            prize_amount: receipt.prize_amount,
            timestamp: now,
        });
        Ok(receipt)
    }

    /// Request phase of a deferred draw.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::InvalidRequest`] in sync mode,
    /// [`LootpotError::PoolNotFound`], or any precondition error of
    /// [`crate::domain::PoolEngine::request_join`].
    pub async fn request_draw(
        &self,
        pool_id: PoolId,
        participant: Address,
        amount: Amount,
    ) -> Result<DrawTicket, LootpotError> {
        self.require_mode(SettlementMode::Deferred)?;
        let handle = self.registry.get(pool_id).await?;
        let mut engine = handle.write().await;
        let now = self.clock.now();
        let ticket = engine.request_join(participant, amount, now)?;
        drop(engine);

        tracing::info!(
            %pool_id,
            request_id = %ticket.request_id,
            participant = %ticket.participant,
            "draw requested"
        );
        let _ = self.event_bus.publish(PoolEvent::ParticipantJoined {
            pool_id,
            address: ticket.participant.clone(),
            amount: ticket.amount,
            timestamp: now,
        });
        let _ = self.event_bus.publish(PoolEvent::DrawRequested {
            pool_id,
            request_id: ticket.request_id,
            address: ticket.participant.clone(),
            amount: ticket.amount,
            timestamp: now,
        });
        Ok(ticket)
    }

    /// Fulfill phase of a deferred draw, answered by the randomness
    /// provider. Unknown or settled requests return `Ok(None)` and change
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Unauthorized`] when `caller` is not the
    /// randomness provider, otherwise [`LootpotError::PoolNotFound`] or
    /// [`LootpotError::Overflow`].
    pub async fn fulfill_draw(
        &self,
        pool_id: PoolId,
        request_id: RequestId,
        random_word: u64,
        caller: &Address,
    ) -> Result<Option<Settlement>, LootpotError> {
        if *caller != self.randomness_provider {
            tracing::warn!(%pool_id, %request_id, %caller, "fulfillment from non-provider rejected");
            return Err(LootpotError::Unauthorized(caller.clone()));
        }
        let handle = self.registry.get(pool_id).await?;
        let mut engine = handle.write().await;
        let settlement = engine.fulfill_draw(request_id, random_word)?;
        drop(engine);

        let Some(settlement) = settlement else {
            tracing::debug!(%pool_id, %request_id, "fulfillment ignored, request not pending");
            return Ok(None);
        };

        tracing::info!(
            %pool_id,
            %request_id,
            participant = %settlement.participant,
            won = settlement.outcome.is_win(),
            "draw fulfilled"
        );
        let _ = self.event_bus.publish(PoolEvent::OutcomeSettled {
            pool_id,
            address: settlement.participant.clone(),
            has_won: settlement.outcome.is_win(),
            prize_amount: settlement.prize_amount,
            timestamp: self.clock.now(),
        });
        Ok(Some(settlement))
    }

    /// Voids every deferred draw pending longer than the draw timeout, in
    /// all pools.
    ///
    /// A pool whose ledger rejects the sweep is logged and skipped so one
    /// bad pool cannot block refunds elsewhere.
    pub async fn void_expired_draws(&self) -> Vec<(PoolId, VoidedDraw)> {
        let now = self.clock.now();
        let mut all = Vec::new();
        for (pool_id, handle) in self.registry.handles().await {
            let mut engine = handle.write().await;
            if engine.pending_draw_count() == 0 {
                continue;
            }
            let voided = match engine.void_expired(now, self.draw_timeout) {
                Ok(voided) => voided,
                Err(e) => {
                    tracing::error!(%pool_id, error = %e, "failed to void expired draws");
                    continue;
                }
            };
            drop(engine);

            for draw in voided {
                tracing::warn!(
                    %pool_id,
                    request_id = %draw.request_id,
                    participant = %draw.participant,
                    refunded = %draw.refunded,
                    "draw voided after timeout"
                );
                let _ = self.event_bus.publish(PoolEvent::DrawVoided {
                    pool_id,
                    request_id: draw.request_id,
                    address: draw.participant.clone(),
                    refunded: draw.refunded,
                    timestamp: now,
                });
                all.push((pool_id, draw));
            }
        }
        all
    }

    fn require_mode(&self, needed: SettlementMode) -> Result<(), LootpotError> {
        if self.mode == needed {
            return Ok(());
        }
        Err(LootpotError::InvalidRequest(match self.mode {
            SettlementMode::Sync => "draws settle synchronously; use join".to_string(),
            SettlementMode::Deferred => "draws are deferred; request a draw instead".to_string(),
        }))
    }

    // ── Lifecycle & withdrawals ─────────────────────────────────────────

    /// Ends an expired pool.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::PoolNotFound`], [`LootpotError::NotYetExpired`]
    /// or [`LootpotError::AlreadyEnded`].
    pub async fn end_pool(&self, pool_id: PoolId) -> Result<DateTime<Utc>, LootpotError> {
        let handle = self.registry.get(pool_id).await?;
        let mut engine = handle.write().await;
        let ended_at = engine.end_pool(self.clock.now())?;
        drop(engine);

        tracing::info!(%pool_id, %ended_at, "pool ended");
        let _ = self.event_bus.publish(PoolEvent::PoolEnded {
            pool_id,
            timestamp: ended_at,
        });
        Ok(ended_at)
    }

    /// Sends a pool's platform fees to its owner.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::PoolNotFound`] or
    /// [`LootpotError::Unauthorized`].
    pub async fn withdraw_platform_fees(
        &self,
        pool_id: PoolId,
        caller: &Address,
    ) -> Result<Transfer, LootpotError> {
        let handle = self.registry.get(pool_id).await?;
        let mut engine = handle.write().await;
        let transfer = engine.withdraw_platform_fees(caller)?;
        drop(engine);

        tracing::info!(%pool_id, amount = %transfer.amount, "platform fees withdrawn");
        let _ = self.event_bus.publish(PoolEvent::FeesWithdrawn {
            pool_id,
            amount: transfer.amount,
            timestamp: self.clock.now(),
        });
        Ok(transfer)
    }

    /// Recovers the residual balance of an ended pool.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::PoolNotFound`],
    /// [`LootpotError::Unauthorized`] or [`LootpotError::StillActive`].
    pub async fn emergency_withdraw(
        &self,
        pool_id: PoolId,
        caller: &Address,
    ) -> Result<Transfer, LootpotError> {
        let handle = self.registry.get(pool_id).await?;
        let mut engine = handle.write().await;
        let transfer = engine.emergency_withdraw(caller)?;
        drop(engine);

        tracing::warn!(%pool_id, amount = %transfer.amount, "emergency withdrawal");
        let _ = self.event_bus.publish(PoolEvent::EmergencyWithdrawn {
            pool_id,
            amount: transfer.amount,
            timestamp: self.clock.now(),
        });
        Ok(transfer)
    }

    /// Pays out prizes and refunds credited to `caller` in a pool.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::PoolNotFound`] or [`LootpotError::Overflow`].
    pub async fn claim_payout(
        &self,
        pool_id: PoolId,
        caller: &Address,
    ) -> Result<Transfer, LootpotError> {
        let handle = self.registry.get(pool_id).await?;
        let mut engine = handle.write().await;
        let transfer = engine.claim_payout(caller)?;
        drop(engine);

        if !transfer.amount.is_zero() {
            tracing::info!(%pool_id, recipient = %caller, amount = %transfer.amount, "payout claimed");
            let _ = self.event_bus.publish(PoolEvent::PayoutClaimed {
                pool_id,
                address: caller.clone(),
                amount: transfer.amount,
                timestamp: self.clock.now(),
            });
        }
        Ok(transfer)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Full view of one pool.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::PoolNotFound`].
    pub async fn pool_detail(&self, pool_id: PoolId) -> Result<PoolDetail, LootpotError> {
        let handle = self.registry.get(pool_id).await?;
        let engine = handle.read().await;
        Ok(PoolDetail::from(&*engine))
    }

    /// Summaries of all pools in creation order.
    pub async fn list_pools(&self) -> Vec<PoolSummary> {
        let handles = self.registry.handles().await;
        let mut summaries = Vec::with_capacity(handles.len());
        for (_, handle) in handles {
            let engine = handle.read().await;
            summaries.push(PoolSummary::from(&*engine));
        }
        summaries
    }

    /// Participant record, or the zero sentinel if `address` never joined.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::PoolNotFound`].
    pub async fn participant(
        &self,
        pool_id: PoolId,
        address: &Address,
    ) -> Result<ParticipantRecord, LootpotError> {
        let handle = self.registry.get(pool_id).await?;
        let engine = handle.read().await;
        Ok(engine.participant(address))
    }

    /// Every pool `address` has joined, newest first.
    pub async fn user_history(&self, address: &Address) -> Vec<ParticipationHistory> {
        let mut history = Vec::new();
        for (_, handle) in self.registry.handles().await {
            let engine = handle.read().await;
            if let Some(row) = ParticipationHistory::for_address(&engine, address) {
                history.push(row);
            }
        }
        history.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
        tracing::debug!(%address, entries = history.len(), "user history loaded");
        history
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::amount::UNITS_PER_COIN;
    use crate::domain::factory::tests::SequentialFactory;
    use crate::domain::oracle::tests::ScriptedOracle;
    use crate::domain::{DrawOutcome, ManualClock};

    const CENT: u128 = UNITS_PER_COIN / 100;
    const CREATION_FEE: Amount = Amount::new(CENT);

    const PROVIDER: &str = "0xfeed";

    struct Harness {
        service: PoolService,
        clock: Arc<ManualClock>,
    }

    fn addr(s: &str) -> Address {
        let Ok(a) = Address::new(s) else {
            panic!("valid address");
        };
        a
    }

    fn harness(outcomes: &[DrawOutcome]) -> Harness {
        harness_in(SettlementMode::Sync, outcomes)
    }

    fn harness_in(mode: SettlementMode, outcomes: &[DrawOutcome]) -> Harness {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let registry = Arc::new(PoolRegistry::new(
            addr("0xadmin"),
            CREATION_FEE,
            Arc::new(SequentialFactory::default()),
        ));
        let service = PoolService::new(
            registry,
            Arc::new(ScriptedOracle::new(outcomes)),
            Arc::clone(&clock) as Arc<dyn Clock>,
            EventBus::new(256),
            Duration::hours(1),
        )
        .with_mode(mode)
        .with_randomness_provider(addr(PROVIDER));
        Harness { service, clock }
    }

    fn params() -> PoolParams {
        PoolParams {
            name: "Test Pool".to_string(),
            min_participation: Amount::new(CENT),
            win_probability_denominator: 10,
            platform_fee_percent: 20,
            duration_days: 7,
        }
    }

    async fn create(h: &Harness) -> PoolId {
        let Ok(id) = h
            .service
            .create_pool(addr("0xc4ea70a"), params(), CREATION_FEE)
            .await
        else {
            panic!("pool creation");
        };
        id
    }

    #[tokio::test]
    async fn create_pool_emits_event() {
        let h = harness(&[]);
        let mut rx = h.service.event_bus().subscribe();
        let id = create(&h).await;

        let Ok(PoolEvent::PoolCreated {
            pool_id,
            name,
            creator,
            ..
        }) = rx.recv().await
        else {
            panic!("expected pool_created");
        };
        assert_eq!(pool_id, id);
        assert_eq!(name, "Test Pool");
        assert_eq!(creator, addr("0xc4ea70a"));
    }

    #[tokio::test]
    async fn rejected_creation_emits_nothing() {
        let h = harness(&[]);
        let mut rx = h.service.event_bus().subscribe();
        let result = h
            .service
            .create_pool(addr("0x1"), params(), Amount::new(CENT / 2))
            .await;
        assert!(matches!(result, Err(LootpotError::InsufficientFee { .. })));
        assert_eq!(h.service.pool_count().await, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn join_emits_joined_then_settled() {
        let h = harness(&[DrawOutcome::Win]);
        let id = create(&h).await;
        let mut rx = h.service.event_bus().subscribe();

        let Ok(receipt) = h
            .service
            .join_pool(id, addr("0xa11ce"), Amount::new(10 * CENT))
            .await
        else {
            panic!("join");
        };
        assert_eq!(receipt.prize_amount, Amount::new(8 * CENT));

        let (Ok(first), Ok(second)) = (rx.recv().await, rx.recv().await) else {
            panic!("two events");
        };
        assert_eq!(first.event_type_str(), "participant_joined");
        let PoolEvent::OutcomeSettled {
            has_won,
            prize_amount,
            ..
        } = second
        else {
            panic!("expected outcome_settled");
        };
        assert!(has_won);
        assert_eq!(prize_amount, Amount::new(8 * CENT));
    }

    #[tokio::test]
    async fn oracle_outage_leaves_pool_untouched() {
        let h = harness(&[]);
        let id = create(&h).await;
        let result = h.service.join_pool(id, addr("0xa11ce"), Amount::new(CENT)).await;
        assert!(matches!(result, Err(LootpotError::OracleUnavailable(_))));

        let Ok(detail) = h.service.pool_detail(id).await else {
            panic!("detail");
        };
        assert_eq!(detail.stats.total_participants, 0);
        assert_eq!(detail.balance, Amount::ZERO);
    }

    #[tokio::test]
    async fn end_pool_needs_clock_past_end_time() {
        let h = harness(&[]);
        let id = create(&h).await;
        let early = h.service.end_pool(id).await;
        assert!(matches!(early, Err(LootpotError::NotYetExpired { .. })));

        h.clock.advance(Duration::days(7) + Duration::seconds(1));
        assert!(h.service.end_pool(id).await.is_ok());
        let again = h.service.end_pool(id).await;
        assert!(matches!(again, Err(LootpotError::AlreadyEnded)));
    }

    #[tokio::test]
    async fn emergency_withdraw_while_active_fails() {
        let h = harness(&[]);
        let id = create(&h).await;
        let result = h.service.emergency_withdraw(id, &addr("0xc4ea70a")).await;
        assert!(matches!(result, Err(LootpotError::StillActive)));
    }

    #[tokio::test]
    async fn sweeper_voids_stale_requests() {
        let h = harness_in(SettlementMode::Deferred, &[]);
        let id = create(&h).await;
        let alice = addr("0xa11ce");
        let Ok(ticket) = h.service.request_draw(id, alice.clone(), Amount::new(CENT)).await else {
            panic!("request");
        };

        assert!(h.service.void_expired_draws().await.is_empty());
        h.clock.advance(Duration::hours(1));
        let mut rx = h.service.event_bus().subscribe();
        let voided = h.service.void_expired_draws().await;
        assert_eq!(voided.len(), 1);
        assert_eq!(voided.first().map(|(p, v)| (*p, v.request_id)), Some((id, ticket.request_id)));
        let Ok(event) = rx.recv().await else {
            panic!("draw_voided event");
        };
        assert_eq!(event.event_type_str(), "draw_voided");

        let late = h
            .service
            .fulfill_draw(id, ticket.request_id, 0, &addr(PROVIDER))
            .await;
        assert!(matches!(late, Ok(None)));

        let Ok(refund) = h.service.claim_payout(id, &alice).await else {
            panic!("claim");
        };
        assert_eq!(refund.amount, Amount::new(CENT));
    }

    #[tokio::test]
    async fn only_the_provider_fulfills_draws() {
        let h = harness_in(SettlementMode::Deferred, &[]);
        let id = create(&h).await;
        let alice = addr("0xa11ce");

        let mut wins = 0;
        for i in 0..20 {
            let player = addr(&format!("0xbeef{i}"));
            let Ok(ticket) = h.service.request_draw(id, player.clone(), Amount::new(CENT)).await
            else {
                panic!("request");
            };
            let own = h.service.fulfill_draw(id, ticket.request_id, 0, &player).await;
            assert!(matches!(own, Err(LootpotError::Unauthorized(_))));
            if let Ok(Some(settlement)) = h
                .service
                .fulfill_draw(id, ticket.request_id, 0, &alice)
                .await
            {
                wins += usize::from(settlement.outcome.is_win());
            }
        }
        assert_eq!(wins, 0);

        let Ok(detail) = h.service.pool_detail(id).await else {
            panic!("detail");
        };
        assert_eq!(detail.pending_draws, 20);

        let Ok(ticket) = h.service.request_draw(id, alice.clone(), Amount::new(CENT)).await else {
            panic!("request");
        };
        let Ok(Some(settlement)) = h
            .service
            .fulfill_draw(id, ticket.request_id, 0, &addr(PROVIDER))
            .await
        else {
            panic!("provider fulfillment");
        };
        assert!(settlement.outcome.is_win());
        let Ok(detail) = h.service.pool_detail(id).await else {
            panic!("detail");
        };
        assert_eq!(detail.pending_draws, 20);
    }

    #[tokio::test]
    async fn mode_gates_entry_points() {
        let sync = harness(&[DrawOutcome::Lose]);
        let id = create(&sync).await;
        let request = sync.service.request_draw(id, addr("0xa11ce"), Amount::new(CENT)).await;
        assert!(matches!(request, Err(LootpotError::InvalidRequest(_))));

        let deferred = harness_in(SettlementMode::Deferred, &[DrawOutcome::Lose]);
        let id = create(&deferred).await;
        let join = deferred.service.join_pool(id, addr("0xa11ce"), Amount::new(CENT)).await;
        assert!(matches!(join, Err(LootpotError::InvalidRequest(_))));
        assert!(deferred.service.request_draw(id, addr("0xa11ce"), Amount::new(CENT)).await.is_ok());
    }

    #[tokio::test]
    async fn history_lists_newest_first() {
        let h = harness(&[DrawOutcome::Lose, DrawOutcome::Win]);
        let first = create(&h).await;
        let second = create(&h).await;
        let _third = create(&h).await;
        let alice = addr("0xa11ce");

        assert!(h.service.join_pool(first, alice.clone(), Amount::new(CENT)).await.is_ok());
        h.clock.advance(Duration::minutes(5));
        assert!(h.service.join_pool(second, alice.clone(), Amount::new(CENT)).await.is_ok());

        let history = h.service.user_history(&alice).await;
        let pools: Vec<PoolId> = history.iter().map(|row| row.pool_id).collect();
        assert_eq!(pools, vec![second, first]);
        assert!(history.first().is_some_and(|row| row.has_won));
        assert!(h.service.user_history(&addr("0xnobody")).await.is_empty());
    }

    #[tokio::test]
    async fn registry_fee_withdrawal_round_trip() {
        let h = harness(&[]);
        let _ = create(&h).await;
        assert_eq!(h.service.registry_fee_balance().await, CREATION_FEE);
        let Ok(transfer) = h.service.withdraw_registry_fees(&addr("0xadmin")).await else {
            panic!("owner withdrawal");
        };
        assert_eq!(transfer.amount, CREATION_FEE);
        assert_eq!(h.service.registry_fee_balance().await, Amount::ZERO);
    }

    #[tokio::test]
    async fn concurrent_joins_on_one_pool_are_serialized() {
        let outcomes = vec![DrawOutcome::Lose; 64];
        let h = harness(&outcomes);
        let id = create(&h).await;
        let service = Arc::new(h.service);

        let mut tasks = Vec::new();
        for i in 0..64 {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move {
                let who = Address::new(&format!("0x{i:02x}"));
                let Ok(who) = who else {
                    panic!("valid address");
                };
                service.join_pool(id, who, Amount::new(CENT)).await
            }));
        }
        for task in tasks {
            let Ok(result) = task.await else {
                panic!("task panicked");
            };
            assert!(result.is_ok());
        }

        let Ok(detail) = service.pool_detail(id).await else {
            panic!("detail");
        };
        assert_eq!(detail.stats.total_participants, 64);
        assert_eq!(detail.stats.total_prize_pool, Amount::new(64 * CENT));
    }
}
