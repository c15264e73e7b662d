//! Pool registry: creation, enumeration and creation-fee bookkeeping.
//!
//! [`PoolRegistry`] keeps pools in insertion order next to a `HashMap`
//! used for O(1) membership and lookup. Each engine sits behind its own
//! [`tokio::sync::RwLock`], so operations on one pool are serialized while
//! different pools proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::pool_engine::Transfer;
use super::{Address, Amount, PoolConfig, PoolEngine, PoolEngineFactory, PoolId, PoolParams};
use crate::error::LootpotError;

/// Shared handle to one pool engine.
pub type PoolHandle = Arc<RwLock<PoolEngine>>;

#[derive(Debug, Default)]
struct RegistryState {
    order: Vec<PoolId>,
    pools: HashMap<PoolId, PoolHandle>,
    fee_balance: Amount,
}

/// Root aggregate that creates and enumerates pools.
///
/// # Concurrency
///
/// - The pool list, membership map and fee balance change together under a
///   single write lock.
/// - Each pool has its own lock; the registry lock is never held while a
///   pool lock is awaited for writing.
#[derive(Debug)]
pub struct PoolRegistry {
    owner: Address,
    creation_fee: Amount,
    factory: Arc<dyn PoolEngineFactory>,
    state: RwLock<RegistryState>,
}

impl PoolRegistry {
    /// Creates an empty registry owned by `owner`.
    #[must_use]
    pub fn new(owner: Address, creation_fee: Amount, factory: Arc<dyn PoolEngineFactory>) -> Self {
        Self {
            owner,
            creation_fee,
            factory,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Registry owner, the only address allowed to withdraw creation fees.
    #[must_use]
    pub const fn owner(&self) -> &Address {
        &self.owner
    }

    /// Flat fee charged per pool.
    #[must_use]
    pub const fn creation_fee(&self) -> Amount {
        self.creation_fee
    }

    /// Deploys a new pool owned by `creator`.
    ///
    /// The creation fee is credited before the pool is inserted, and both
    /// happen under one write lock, so no reader can observe the pool
    /// without the fee.
    ///
    /// # Errors
    ///
    /// - [`LootpotError::InsufficientFee`] if `paid_fee` is below the
    ///   creation fee.
    /// - [`LootpotError::InvalidConfig`] if `params` violate a pool
    ///   invariant.
    /// - [`LootpotError::Overflow`] if the fee balance would overflow.
    /// - [`LootpotError::Internal`] if the factory reuses an address.
    pub async fn create_pool(
        &self,
        creator: Address,
        params: PoolParams,
        paid_fee: Amount,
        now: DateTime<Utc>,
    ) -> Result<PoolId, LootpotError> {
        if paid_fee < self.creation_fee {
            return Err(LootpotError::InsufficientFee {
                paid: paid_fee,
                required: self.creation_fee,
            });
        }
        let config = PoolConfig::new(params, now)?;

        let mut state = self.state.write().await;
        let fee_balance = state.fee_balance.checked_add(paid_fee)?;
        let engine = self.factory.deploy(creator, config);
        let pool_id = engine.id();
        if state.pools.contains_key(&pool_id) {
            return Err(LootpotError::Internal(format!(
                "factory produced duplicate pool address {pool_id}"
            )));
        }

        state.fee_balance = fee_balance;
        state.pools.insert(pool_id, Arc::new(RwLock::new(engine)));
        state.order.push(pool_id);
        Ok(pool_id)
    }

    /// Returns the lock-protected engine for `pool_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::PoolNotFound`] if the pool is not registered.
    pub async fn get(&self, pool_id: PoolId) -> Result<PoolHandle, LootpotError> {
        let state = self.state.read().await;
        state
            .pools
            .get(&pool_id)
            .cloned()
            .ok_or(LootpotError::PoolNotFound(pool_id))
    }

    /// Number of registered pools.
    pub async fn pool_count(&self) -> usize {
        self.state.read().await.order.len()
    }

    /// Address of the `index`-th pool in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::IndexOutOfRange`] if `index >= pool_count`.
    pub async fn pool_by_index(&self, index: usize) -> Result<PoolId, LootpotError> {
        let state = self.state.read().await;
        state
            .order
            .get(index)
            .copied()
            .ok_or(LootpotError::IndexOutOfRange {
                index,
                count: state.order.len(),
            })
    }

    /// O(1) membership test.
    pub async fn is_pool(&self, pool_id: PoolId) -> bool {
        self.state.read().await.pools.contains_key(&pool_id)
    }

    /// Snapshot of all pool addresses in creation order.
    pub async fn all_pools(&self) -> Vec<PoolId> {
        self.state.read().await.order.clone()
    }

    /// Snapshot of all engines in creation order.
    pub async fn handles(&self) -> Vec<(PoolId, PoolHandle)> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.pools.get(id).map(|h| (*id, Arc::clone(h))))
            .collect()
    }

    /// Creation fees collected and not yet withdrawn.
    pub async fn fee_balance(&self) -> Amount {
        self.state.read().await.fee_balance
    }

    /// Sends the whole fee balance to the owner and resets it.
    ///
    /// A zero balance yields a zero transfer rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Unauthorized`] if `caller` is not the owner.
    pub async fn withdraw_fees(&self, caller: &Address) -> Result<Transfer, LootpotError> {
        if caller != &self.owner {
            return Err(LootpotError::Unauthorized(caller.clone()));
        }
        let mut state = self.state.write().await;
        let amount = std::mem::take(&mut state.fee_balance);
        Ok(Transfer {
            to: self.owner.clone(),
            amount,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::factory::tests::SequentialFactory;

    const FEE: Amount = Amount::new(10_000_000_000_000_000);

    fn addr(s: &str) -> Address {
        let Ok(a) = Address::new(s) else {
            panic!("valid address");
        };
        a
    }

    fn registry() -> PoolRegistry {
        PoolRegistry::new(addr("0xadmin"), FEE, Arc::new(SequentialFactory::default()))
    }

    fn params(name: &str) -> PoolParams {
        PoolParams {
            name: name.to_string(),
            min_participation: Amount::new(10_000_000_000_000_000),
            win_probability_denominator: 10,
            platform_fee_percent: 20,
            duration_days: 7,
        }
    }

    #[tokio::test]
    async fn create_registers_pool_and_collects_fee() {
        let reg = registry();
        let creator = addr("0xc4ea70a");
        let Ok(id) = reg
            .create_pool(creator.clone(), params("Test Pool"), FEE, Utc::now())
            .await
        else {
            panic!("pool creation");
        };
        assert_eq!(reg.pool_count().await, 1);
        assert_eq!(reg.pool_by_index(0).await.ok(), Some(id));
        assert!(reg.is_pool(id).await);
        assert_eq!(reg.fee_balance().await, FEE);

        let Ok(handle) = reg.get(id).await else {
            panic!("pool lookup");
        };
        let engine = handle.read().await;
        assert_eq!(engine.owner(), &creator);
        assert_eq!(engine.config().name, "Test Pool");
    }

    #[tokio::test]
    async fn insufficient_fee_leaves_registry_unchanged() {
        let reg = registry();
        let low = Amount::new(FEE.get() / 2);
        let result = reg
            .create_pool(addr("0x1"), params("Cheap"), low, Utc::now())
            .await;
        assert!(matches!(result, Err(LootpotError::InsufficientFee { .. })));
        assert_eq!(reg.pool_count().await, 0);
        assert_eq!(reg.fee_balance().await, Amount::ZERO);
    }

    #[tokio::test]
    async fn invalid_config_rejected_before_creation() {
        let reg = registry();
        let mut bad = params("Greedy");
        bad.platform_fee_percent = 80;
        let result = reg.create_pool(addr("0x1"), bad, FEE, Utc::now()).await;
        assert!(matches!(result, Err(LootpotError::InvalidConfig(_))));
        assert_eq!(reg.pool_count().await, 0);
        assert_eq!(reg.fee_balance().await, Amount::ZERO);
    }

    #[tokio::test]
    async fn enumeration_preserves_insertion_order() {
        let reg = registry();
        let mut ids = Vec::new();
        for name in ["one", "two", "three"] {
            let Ok(id) = reg.create_pool(addr("0x1"), params(name), FEE, Utc::now()).await else {
                panic!("pool creation");
            };
            ids.push(id);
        }
        assert_eq!(reg.all_pools().await, ids);
        assert_eq!(reg.pool_count().await, 3);
        let out_of_range = reg.pool_by_index(3).await;
        assert!(matches!(
            out_of_range,
            Err(LootpotError::IndexOutOfRange { index: 3, count: 3 })
        ));
        assert!(!reg.is_pool(PoolId::new()).await);
    }

    #[tokio::test]
    async fn overpayment_is_credited_in_full() {
        let reg = registry();
        let paid = Amount::new(FEE.get() * 2);
        assert!(
            reg.create_pool(addr("0x1"), params("Generous"), paid, Utc::now())
                .await
                .is_ok()
        );
        assert_eq!(reg.fee_balance().await, paid);
    }

    #[tokio::test]
    async fn withdraw_fees_owner_only_and_resets() {
        let reg = registry();
        let _ = reg.create_pool(addr("0x1"), params("a"), FEE, Utc::now()).await;
        let _ = reg.create_pool(addr("0x2"), params("b"), FEE, Utc::now()).await;

        let denied = reg.withdraw_fees(&addr("0x1")).await;
        assert!(matches!(denied, Err(LootpotError::Unauthorized(_))));
        assert_eq!(reg.fee_balance().await, Amount::new(FEE.get() * 2));

        let Ok(transfer) = reg.withdraw_fees(&addr("0xadmin")).await else {
            panic!("owner withdrawal");
        };
        assert_eq!(transfer.amount, Amount::new(FEE.get() * 2));
        assert_eq!(reg.fee_balance().await, Amount::ZERO);

        let Ok(empty) = reg.withdraw_fees(&addr("0xadmin")).await else {
            panic!("zero withdrawal must not fail");
        };
        assert_eq!(empty.amount, Amount::ZERO);
    }

    #[tokio::test]
    async fn get_unknown_pool_fails() {
        let reg = registry();
        let result = reg.get(PoolId::new()).await;
        assert!(matches!(result, Err(LootpotError::PoolNotFound(_))));
    }
}
