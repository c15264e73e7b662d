//! Per-connection subscription manager.
//!
//! Tracks which pools a WebSocket client follows and filters events
//! server-side.

use std::collections::HashSet;

use crate::domain::PoolId;

/// Manages the set of pool subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed pool IDs. Ignored while `subscribe_all` is set.
    pool_ids: HashSet<PoolId>,
    /// Wildcard `"*"` subscription.
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds pool IDs to the subscription set, optionally enabling the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[PoolId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.pool_ids.extend(ids.iter().copied());
    }

    /// Removes pool IDs from the subscription set. `wildcard` clears the
    /// wildcard as well.
    pub fn unsubscribe(&mut self, ids: &[PoolId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.pool_ids.remove(id);
        }
    }

    /// Whether an event scoped to `pool_id` passes the filter. Registry-wide
    /// events (`None`) only reach wildcard subscribers.
    #[must_use]
    pub fn matches(&self, pool_id: Option<PoolId>) -> bool {
        match pool_id {
            _ if self.subscribe_all => true,
            Some(id) => self.pool_ids.contains(&id),
            None => false,
        }
    }

    /// Returns the number of explicitly subscribed pool IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pool_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(Some(PoolId::new())));
        assert!(!mgr.matches(None));
    }

    #[test]
    fn single_pool_filter() {
        let mut mgr = SubscriptionManager::new();
        let id = PoolId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(Some(id)));
        assert!(!mgr.matches(Some(PoolId::new())));
        assert!(!mgr.matches(None));
    }

    #[test]
    fn wildcard_sees_registry_events() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(Some(PoolId::new())));
        assert!(mgr.matches(None));

        mgr.unsubscribe(&[], true);
        assert!(!mgr.is_subscribed_all());
        assert!(!mgr.matches(None));
    }

    #[test]
    fn unsubscribe_removes_pool() {
        let mut mgr = SubscriptionManager::new();
        let id = PoolId::new();
        mgr.subscribe(&[id, PoolId::new()], false);
        assert_eq!(mgr.count(), 2);
        mgr.unsubscribe(&[id], false);
        assert!(!mgr.matches(Some(id)));
        assert_eq!(mgr.count(), 1);
    }
}
