//! Persistence layer: append-only PostgreSQL event log.
//!
//! Pool state lives in memory; the log records every committed event so
//! the history survives restarts for offline audits. The
//! writer task subscribes to the event bus and never blocks the request
//! path.

pub mod event_log;
pub mod postgres;

pub use event_log::spawn_event_log_writer;
pub use postgres::PostgresPersistence;
