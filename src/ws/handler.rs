//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use super::subscription::SubscriptionManager;
use crate::app_state::AppState;
use crate::domain::PoolId;

/// Query parameters accepted on upgrade.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Only stream events for this pool. All pools when absent.
    pub pool_id: Option<uuid::Uuid>,
}

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let event_rx = state.event_bus.subscribe();
    let pool_service = std::sync::Arc::clone(&state.pool_service);

    let mut subs = SubscriptionManager::new();
    match params.pool_id {
        Some(id) => subs.subscribe(&[PoolId::from_uuid(id)], false),
        None => subs.subscribe(&[], true),
    }

    ws.on_upgrade(move |socket| run_connection(socket, event_rx, pool_service, subs))
}
