//! WebSocket connection loop.
//!
//! Forwards filtered events from the bus and answers client commands on a
//! single connection.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{PoolEvent, PoolId};
use crate::service::PoolService;

/// Runs the read/write loop for a single WebSocket connection until the
/// client disconnects or the bus closes.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<PoolEvent>,
    pool_service: Arc<PoolService>,
    mut subs: SubscriptionManager,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &pool_service).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(pool_event) => {
                        if !subs.matches(pool_event.pool_id()) {
                            continue;
                        }
                        let Ok(payload) = serde_json::to_value(&pool_event) else {
                            continue;
                        };
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            payload,
                        );
                        let Ok(json) = serde_json::to_string(&msg) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text frame from the client, returning an optional JSON reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    pool_service: &PoolService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON"))
            .ok();
    };

    let reply = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(WsCommand::Subscribe { pool_ids }) => {
            let (ids, wildcard) = parse_pool_ids(&pool_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        Ok(WsCommand::Unsubscribe { pool_ids }) => {
            let (ids, wildcard) = parse_pool_ids(&pool_ids);
            subs.unsubscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        Ok(WsCommand::GetPool { pool_id }) => match pool_id.parse::<PoolId>() {
            Ok(pool_id) => match pool_service.pool_detail(pool_id).await {
                Ok(detail) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::to_value(&detail).unwrap_or_default(),
                ),
                Err(e) => WsMessage::error(msg.id, e.status_code().as_u16(), &e.to_string()),
            },
            Err(_) => WsMessage::error(msg.id, 400, "invalid pool_id"),
        },
        Err(_) => WsMessage::error(msg.id, 404, "unknown command"),
    };

    serde_json::to_string(&reply).ok()
}

/// Splits raw pool id strings into parsed ids and the `"*"` wildcard flag.
/// Unparsable entries are skipped.
fn parse_pool_ids(raw: &[String]) -> (Vec<PoolId>, bool) {
    let wildcard = raw.iter().any(|s| s == "*");
    let ids = raw.iter().filter_map(|s| s.parse::<PoolId>().ok()).collect();
    (ids, wildcard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_garbage_are_separated() {
        let id = PoolId::new();
        let raw = vec!["*".to_string(), id.to_string(), "not-a-uuid".to_string()];
        let (ids, wildcard) = parse_pool_ids(&raw);
        assert!(wildcard);
        assert_eq!(ids, vec![id]);
    }
}
