//! Server assembly: wires the domain, service and HTTP layers together.
//!
//! Shared by the binary and the HTTP integration tests so both run the
//! same router and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::domain::{
    Clock, DefaultPoolEngineFactory, EntropyOracle, EventBus, PoolRegistry, RandomnessOracle,
    SeededOracle, SettlementMode, SystemClock,
};
use crate::service::PoolService;
use crate::ws::handler::ws_handler;

/// Picks the oracle for the configured seed: reproducible when seeded,
/// OS entropy otherwise.
#[must_use]
pub fn build_oracle(seed: Option<u64>) -> Arc<dyn RandomnessOracle> {
    match seed {
        Some(seed) => {
            tracing::warn!(seed, "using seeded oracle, outcomes are predictable");
            Arc::new(SeededOracle::new(seed))
        }
        None => Arc::new(EntropyOracle),
    }
}

/// Builds the pool service described by `config` on the wall clock.
#[must_use]
pub fn build_service(config: &GatewayConfig) -> Arc<PoolService> {
    let registry = Arc::new(PoolRegistry::new(
        config.registry_owner.clone(),
        config.creation_fee,
        Arc::new(DefaultPoolEngineFactory),
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let draw_timeout = i64::try_from(config.draw_timeout_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX);

    Arc::new(PoolService::new(
        registry,
        build_oracle(config.oracle_seed),
        clock,
        EventBus::new(config.event_bus_capacity),
        draw_timeout,
    )
    .with_mode(config.oracle_mode)
    .with_randomness_provider(config.randomness_provider.clone()))
}

/// Builds the full HTTP application: REST routes, `/ws`, and middleware.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}

/// Spawns the task that voids deferred draws nobody fulfilled in time.
///
/// Only runs in [`SettlementMode::Deferred`]; returns `None` otherwise.
#[must_use]
pub fn spawn_draw_sweeper(service: Arc<PoolService>, every: Duration) -> Option<JoinHandle<()>> {
    if service.mode() != SettlementMode::Deferred {
        return None;
    }
    let every = every.max(Duration::from_secs(1));
    Some(tokio::spawn(async move {
        tracing::info!(interval_secs = every.as_secs(), "draw sweeper started");
        loop {
            tokio::time::sleep(every).await;
            let voided = service.void_expired_draws().await;
            if !voided.is_empty() {
                tracing::info!(count = voided.len(), "voided timed-out draws");
            }
        }
    }))
}
