//! Domain layer: lottery engine, registry, randomness and event types.
//!
//! Everything with an invariant lives here: pool configuration and its
//! validation, the per-pool [`PoolEngine`] state machine, the
//! [`PoolRegistry`] aggregate, and the [`RandomnessOracle`], [`Clock`] and
//! [`PoolEngineFactory`] capabilities injected into them.

pub mod address;
pub mod amount;
pub mod clock;
pub mod event_bus;
pub mod factory;
pub mod oracle;
pub mod participant;
pub mod pool_config;
pub mod pool_engine;
pub mod pool_event;
pub mod pool_id;
pub mod pool_registry;
pub mod pool_summary;

pub use address::Address;
pub use amount::Amount;
pub use clock::{Clock, ManualClock, SystemClock};
pub use event_bus::EventBus;
pub use factory::{DefaultPoolEngineFactory, PoolEngineFactory};
pub use oracle::{
    DrawOutcome, DrawRequest, EntropyOracle, RandomnessOracle, SeededOracle, SettlementMode,
};
pub use participant::{DrawState, EntryStatus, ParticipantRecord, PendingDraw, RequestId};
pub use pool_config::{PoolConfig, PoolParams};
pub use pool_engine::{
    DrawTicket, JoinReceipt, PoolEngine, PoolState, PoolStats, Settlement, Transfer, VoidedDraw,
};
pub use pool_event::PoolEvent;
pub use pool_id::PoolId;
pub use pool_registry::{PoolHandle, PoolRegistry};
pub use pool_summary::{ParticipationHistory, PoolDetail, PoolSummary};
