//! Service layer: business logic orchestration.
//!
//! [`PoolService`] coordinates registry and engine operations, consults the
//! injected randomness oracle and clock, and emits events through the
//! [`super::domain::EventBus`].

pub mod pool_service;

pub use pool_service::PoolService;
