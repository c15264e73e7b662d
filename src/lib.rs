//! # lootpot
//!
//! A pooled, time-bounded lottery service. A registry deploys independent
//! pools; each pool accepts one deposit per participant, draws a win or
//! loss against fixed odds, and pays winners from the accumulated pot
//! after a platform fee.
//!
//! Draws settle in one call against a local oracle, or in two phases
//! (request, then fulfill) when randomness comes from an external
//! provider. Prizes and refunds are credited to a claimable balance and
//! paid out on request.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── PoolService (service/)
//!     ├── EventBus (domain/) ──── Event log (persistence/)
//!     │
//!     ├── PoolRegistry (domain/)
//!     └── PoolEngine × N, RandomnessOracle, Clock (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
pub mod ws;
