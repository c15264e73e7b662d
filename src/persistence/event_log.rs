//! Background task that copies bus events into the event log.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::PostgresPersistence;
use crate::domain::EventBus;

/// Subscribes to `bus` and appends every event to `persistence` until the
/// bus closes.
///
/// Write failures are logged and skipped; the in-memory state stays
/// authoritative. A lagging writer logs how many events it missed.
#[must_use]
pub fn spawn_event_log_writer(persistence: PostgresPersistence, bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = persistence.record(&event).await {
                        tracing::error!(
                            event_type = event.event_type_str(),
                            error = %e,
                            "failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event log writer lagged, events not persisted");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!("event log writer stopped");
    })
}
