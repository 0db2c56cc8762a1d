//! Connection registry.
//!
//! # Responsibilities
//! - Own the ordered endpoint collection and its `address → index` table
//! - Serve strategy-driven selection to concurrent callers
//! - Apply membership changes from the topology manager
//!
//! # Design Decisions
//! - One `RwLock` guards the collection, the index table and the strategy together:
//!   shared for `select`/`list`/`map`, exclusive for `add`/`remove`/`set_strategy`
//! - Removal swaps the target with the last element (O(1)); insertion order is
//!   not preserved across removals
//! - Handles are opened before the lock is taken and closed after it is released

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::balancer::{BalanceStrategy, RoundRobinStrategy};
use crate::endpoint::{Connection, Connector, Endpoint, NodeAddress};
use crate::error::{RouterError, RouterResult};
use crate::observability::metrics;

struct Inner<C> {
    endpoints: Vec<Arc<Endpoint<C>>>,
    /// Key: endpoint address, value: position in `endpoints`.
    index: HashMap<String, usize>,
    strategy: Box<dyn BalanceStrategy>,
}

/// Thread-safe collection of live endpoints.
///
/// Handles still registered when the registry is dropped are closed.
pub struct ConnectionRegistry<C: Connection> {
    inner: RwLock<Inner<C>>,
    /// Shared selection counter advanced by the active strategy.
    counter: AtomicU64,
}

impl<C: Connection> ConnectionRegistry<C> {
    /// Create an empty registry using round-robin selection.
    pub fn new() -> Self {
        Self::with_strategy(Box::new(RoundRobinStrategy::new()))
    }

    pub fn with_strategy(strategy: Box<dyn BalanceStrategy>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                endpoints: Vec::new(),
                index: HashMap::new(),
                strategy,
            }),
            counter: AtomicU64::new(0),
        }
    }

    /// Replace the active balance strategy.
    pub fn set_strategy(&self, strategy: Box<dyn BalanceStrategy>) {
        let mut inner = self.inner.write();
        tracing::debug!(
            from = inner.strategy.name(),
            to = strategy.name(),
            "Balance strategy changed"
        );
        inner.strategy = strategy;
    }

    pub fn strategy_name(&self) -> &'static str {
        self.inner.read().strategy.name()
    }

    /// Insert `handle` under `address`, or replace the handle already stored there.
    ///
    /// Returns the replaced endpoint, whose handle the caller should close.
    /// A malformed address is rejected before the registry is touched.
    pub fn add(&self, address: &str, handle: C) -> RouterResult<Option<Arc<Endpoint<C>>>> {
        address.parse::<NodeAddress>()?;
        let endpoint = Arc::new(Endpoint::new(address, handle));

        let (replaced, len) = {
            let mut inner = self.inner.write();
            let existing = inner.index.get(address).copied();
            let replaced = match existing {
                Some(i) => Some(std::mem::replace(&mut inner.endpoints[i], endpoint)),
                None => {
                    inner.endpoints.push(endpoint);
                    let i = inner.endpoints.len() - 1;
                    inner.index.insert(address.to_string(), i);
                    None
                }
            };
            (replaced, inner.endpoints.len())
        };

        metrics::record_registry_size(len);
        tracing::debug!(
            address = %address,
            replaced = replaced.is_some(),
            endpoints = len,
            "Endpoint added"
        );
        Ok(replaced)
    }

    /// Open a handle to `address` with `connector` and add it.
    ///
    /// The connect happens before the registry lock is taken.
    pub async fn connect<K>(&self, connector: &K, address: &str) -> RouterResult<()>
    where
        K: Connector<Conn = C>,
    {
        let node: NodeAddress = address.parse()?;
        let handle = connector.connect(&node).await.map_err(|source| RouterError::Connect {
            address: address.to_string(),
            source,
        })?;

        if let Some(old) = self.add(address, handle)? {
            old.close();
        }
        Ok(())
    }

    /// Remove the endpoint for `address`. No-op if absent.
    ///
    /// The last endpoint takes the removed one's slot. The removed endpoint is
    /// returned so the caller can close its handle outside the lock.
    pub fn remove(&self, address: &str) -> Option<Arc<Endpoint<C>>> {
        let (removed, len) = {
            let mut inner = self.inner.write();
            let i = inner.index.remove(address)?;
            let removed = inner.endpoints.swap_remove(i);
            if i < inner.endpoints.len() {
                let moved = inner.endpoints[i].address().to_string();
                inner.index.insert(moved, i);
            }
            (removed, inner.endpoints.len())
        };

        metrics::record_registry_size(len);
        tracing::debug!(address = %address, endpoints = len, "Endpoint removed");
        Some(removed)
    }

    /// Pick an endpoint with the active strategy.
    pub fn select(&self) -> RouterResult<Arc<Endpoint<C>>> {
        let inner = self.inner.read();
        if inner.endpoints.is_empty() {
            return Err(RouterError::NoEndpointAvailable);
        }

        let len = inner.endpoints.len();
        let i = inner.strategy.next(&self.counter, len as u64) as usize;
        inner
            .endpoints
            .get(i)
            .cloned()
            .ok_or(RouterError::NoEndpointAvailable)
    }

    /// Pick the endpoint under the current counter position without advancing it.
    ///
    /// For internal reads that must not disturb the rotation seen by callers.
    pub fn peek(&self) -> RouterResult<Arc<Endpoint<C>>> {
        let inner = self.inner.read();
        if inner.endpoints.is_empty() {
            return Err(RouterError::NoEndpointAvailable);
        }

        let i = (self.counter.load(Ordering::Relaxed) % inner.endpoints.len() as u64) as usize;
        inner
            .endpoints
            .get(i)
            .cloned()
            .ok_or(RouterError::NoEndpointAvailable)
    }

    pub fn get(&self, address: &str) -> Option<Arc<Endpoint<C>>> {
        let inner = self.inner.read();
        inner.index.get(address).map(|&i| inner.endpoints[i].clone())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner.read().index.contains_key(address)
    }

    /// Snapshot of the endpoints in current order.
    pub fn list(&self) -> Vec<Arc<Endpoint<C>>> {
        self.inner.read().endpoints.clone()
    }

    /// Snapshot of `address → endpoint`.
    pub fn map(&self) -> HashMap<String, Arc<Endpoint<C>>> {
        let inner = self.inner.read();
        inner
            .index
            .iter()
            .map(|(address, &i)| (address.clone(), inner.endpoints[i].clone()))
            .collect()
    }

    /// Snapshot of `address → index`.
    pub fn indices(&self) -> HashMap<String, usize> {
        self.inner.read().index.clone()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.inner
            .read()
            .endpoints
            .iter()
            .map(|e| e.address().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every endpoint, returning them for closing.
    pub fn drain(&self) -> Vec<Arc<Endpoint<C>>> {
        let drained = {
            let mut inner = self.inner.write();
            inner.index.clear();
            std::mem::take(&mut inner.endpoints)
        };
        metrics::record_registry_size(0);
        drained
    }

    /// Remove and close every endpoint.
    pub fn close_all(&self) {
        for endpoint in self.drain() {
            endpoint.close();
        }
    }

    /// Check that every indexed address points at the endpoint with that address.
    pub fn is_consistent(&self) -> bool {
        let inner = self.inner.read();
        inner.index.len() == inner.endpoints.len()
            && inner
                .index
                .iter()
                .all(|(address, &i)| inner.endpoints.get(i).is_some_and(|e| e.address() == address))
    }
}

impl<C: Connection> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> Drop for ConnectionRegistry<C> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        inner.index.clear();
        let remaining = std::mem::take(&mut inner.endpoints);
        if remaining.is_empty() {
            return;
        }

        tracing::debug!(endpoints = remaining.len(), "Closing endpoints of dropped registry");
        for endpoint in remaining {
            endpoint.close();
        }
    }
}

impl<C: Connection> std::fmt::Debug for ConnectionRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ConnectionRegistry")
            .field("endpoints", &inner.index.keys().collect::<Vec<_>>())
            .field("strategy", &inner.strategy.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::RandomStrategy;
    use crate::endpoint::mock::{MockCluster, MockConnection, MockConnector};
    use std::collections::HashSet;

    fn registry_with(addresses: &[&str]) -> ConnectionRegistry<MockConnection> {
        let registry = ConnectionRegistry::new();
        for address in addresses {
            registry.add(address, MockConnection::detached(address)).unwrap();
        }
        registry
    }

    #[test]
    fn test_add_appends_and_indexes() {
        let registry = registry_with(&["a:1", "b:1", "c:1"]);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.addresses(), vec!["a:1", "b:1", "c:1"]);
        assert_eq!(registry.indices()["c:1"], 2);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_add_existing_replaces_in_place() {
        let registry = registry_with(&["a:1", "b:1"]);

        let replaced = registry.add("a:1", MockConnection::detached("a:1")).unwrap();
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.indices()["a:1"], 0);
    }

    #[test]
    fn test_add_rejects_bad_address() {
        let registry = registry_with(&["a:1"]);

        let err = registry.add("no-port", MockConnection::detached("a:1")).unwrap_err();
        assert!(matches!(err, RouterError::InvalidAddress { .. }));
        assert_eq!(registry.len(), 1);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_remove_middle_moves_last() {
        let registry = registry_with(&["a:1", "b:1", "c:1"]);

        let removed = registry.remove("b:1").unwrap();
        assert_eq!(removed.address(), "b:1");

        let indices = registry.indices();
        assert_eq!(indices.len(), 2);
        assert_eq!(indices["a:1"], 0);
        assert_eq!(indices["c:1"], 1);
        assert_eq!(registry.addresses(), vec!["a:1", "c:1"]);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_remove_last_keeps_order() {
        let registry = registry_with(&["a:1", "b:1", "c:1"]);

        registry.remove("c:1");
        assert_eq!(registry.addresses(), vec!["a:1", "b:1"]);
        assert_eq!(registry.indices()["b:1"], 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let registry = registry_with(&["a:1"]);
        assert!(registry.remove("z:1").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_select_empty() {
        let registry: ConnectionRegistry<MockConnection> = ConnectionRegistry::new();
        assert!(matches!(registry.select(), Err(RouterError::NoEndpointAvailable)));
    }

    #[test]
    fn test_select_round_robin_visits_each_once() {
        let registry = registry_with(&["a:1", "b:1", "c:1"]);

        let picked: Vec<String> = (0..3)
            .map(|_| registry.select().unwrap().address().to_string())
            .collect();
        assert_eq!(picked, vec!["a:1", "b:1", "c:1"]);
    }

    #[test]
    fn test_select_concurrent_even_split() {
        let registry = registry_with(&["a:1", "b:1"]);
        let hits = parking_lot::Mutex::new(HashMap::<String, usize>::new());

        std::thread::scope(|s| {
            for _ in 0..1000 {
                s.spawn(|| {
                    let endpoint = registry.select().unwrap();
                    *hits.lock().entry(endpoint.address().to_string()).or_default() += 1;
                });
            }
        });

        let hits = hits.into_inner();
        assert_eq!(hits["a:1"], 500);
        assert_eq!(hits["b:1"], 500);
    }

    #[test]
    fn test_set_strategy() {
        let registry = registry_with(&["a:1", "b:1"]);
        assert_eq!(registry.strategy_name(), "round_robin");

        registry.set_strategy(Box::new(RandomStrategy::new()));
        assert_eq!(registry.strategy_name(), "random");
        for _ in 0..50 {
            registry.select().unwrap();
        }
    }

    #[test]
    fn test_snapshots_are_copies() {
        let registry = registry_with(&["a:1", "b:1"]);
        let list = registry.list();
        let map = registry.map();

        registry.remove("a:1");
        assert_eq!(list.len(), 2);
        assert!(map.contains_key("a:1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_churn_stays_consistent() {
        let registry = registry_with(&["a:1", "b:1"]);
        let churn: Vec<String> = (0..8).map(|i| format!("churn-{i}:1")).collect();

        std::thread::scope(|s| {
            for address in &churn {
                let registry = &registry;
                s.spawn(move || {
                    for _ in 0..200 {
                        registry.add(address, MockConnection::detached(address)).unwrap();
                        registry.remove(address);
                    }
                });
            }
            for _ in 0..16 {
                s.spawn(|| {
                    for _ in 0..500 {
                        let endpoint = registry.select().unwrap();
                        assert!(!endpoint.address().is_empty());
                    }
                });
            }
        });

        assert!(registry.is_consistent());
        let remaining: HashSet<String> = registry.addresses().into_iter().collect();
        assert_eq!(remaining, HashSet::from(["a:1".to_string(), "b:1".to_string()]));
    }

    #[tokio::test]
    async fn test_connect_adds_and_closes_replaced() {
        let cluster = MockCluster::new();
        let connector = MockConnector::new(cluster.clone());
        let registry = ConnectionRegistry::new();

        registry.connect(&connector, "a:1").await.unwrap();
        registry.connect(&connector, "a:1").await.unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(cluster.connect_count("a:1"), 2);
        assert_eq!(cluster.closed_count("a:1"), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_registry_untouched() {
        let cluster = MockCluster::new();
        cluster.set_refusing("a:1", true);
        let connector = MockConnector::new(cluster);
        let registry = ConnectionRegistry::new();

        let err = registry.connect(&connector, "a:1").await.unwrap_err();
        assert!(matches!(err, RouterError::Connect { .. }));
        let err = registry.connect(&connector, "bad").await.unwrap_err();
        assert!(matches!(err, RouterError::InvalidAddress { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_close_all() {
        let registry = registry_with(&["a:1", "b:1"]);
        let list = registry.list();

        registry.close_all();
        assert!(registry.is_empty());
        assert!(list.iter().all(|e| e.handle().is_closed()));
    }

    #[test]
    fn test_peek_does_not_advance_rotation() {
        let registry = registry_with(&["a:1", "b:1", "c:1"]);

        let empty: ConnectionRegistry<MockConnection> = ConnectionRegistry::new();
        assert!(matches!(empty.peek(), Err(RouterError::NoEndpointAvailable)));
        assert_eq!(registry.select().unwrap().address(), "a:1");
        assert_eq!(registry.peek().unwrap().address(), "b:1");
        assert_eq!(registry.peek().unwrap().address(), "b:1");
        assert_eq!(registry.select().unwrap().address(), "b:1");
        assert_eq!(registry.select().unwrap().address(), "c:1");
    }

    #[test]
    fn test_drop_closes_remaining_handles() {
        let registry = registry_with(&["a:1", "b:1", "c:1"]);
        let removed = registry.remove("b:1").unwrap();
        let list = registry.list();

        drop(registry);
        assert!(list.iter().all(|e| e.handle().is_closed()));
        // Removed endpoints belong to the caller.
        assert!(!removed.handle().is_closed());
    }
}
