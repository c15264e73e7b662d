//! Pool deployment capability.
//!
//! The [`PoolRegistry`](super::PoolRegistry) never constructs engines
//! directly; it asks an injected [`PoolEngineFactory`], which assigns the
//! pool address. Tests substitute factories with predictable addresses.

use std::fmt;

use super::{Address, PoolConfig, PoolEngine, PoolId};

/// Builds new pool engines.
pub trait PoolEngineFactory: Send + Sync + fmt::Debug {
    /// Deploys an engine owned by `owner` with a validated `config`.
    fn deploy(&self, owner: Address, config: PoolConfig) -> PoolEngine;
}

/// Factory assigning random UUID v4 pool addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPoolEngineFactory;

impl PoolEngineFactory for DefaultPoolEngineFactory {
    fn deploy(&self, owner: Address, config: PoolConfig) -> PoolEngine {
        PoolEngine::new(PoolId::new(), owner, config)
    }
}
