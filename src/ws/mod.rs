//! WebSocket layer: live event stream with per-connection pool filters.
//!
//! Clients connect to `/ws`, optionally with `?pool_id=<id>` to start with
//! a single-pool filter, and may adjust the filter with `subscribe` and
//! `unsubscribe` commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
