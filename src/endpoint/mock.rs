//! In-memory connections for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::endpoint::{Connection, Connector, NodeAddress};
use crate::error::ConnectionError;
use crate::topology::TopologyRow;

/// Shared fake cluster state observed by every mock handle.
#[derive(Debug, Default)]
pub struct MockCluster {
    rows: Mutex<Vec<TopologyRow>>,
    topology_down: AtomicBool,
    unreachable: Mutex<HashSet<String>>,
    refusing: Mutex<HashSet<String>>,
    connects: Mutex<HashMap<String, usize>>,
    closed: Mutex<HashMap<String, usize>>,
    pings: AtomicUsize,
}

impl MockCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the topology table with `(address, state)` rows.
    pub fn set_topology(&self, rows: &[(&str, &str)]) {
        *self.rows.lock() = rows
            .iter()
            .map(|(address, state)| TopologyRow {
                address: address.to_string(),
                current_state: json!([state, 1]),
            })
            .collect();
    }

    pub fn set_raw_topology(&self, rows: Vec<TopologyRow>) {
        *self.rows.lock() = rows;
    }

    pub fn set_topology_down(&self, down: bool) {
        self.topology_down.store(down, Ordering::SeqCst);
    }

    /// Pings to `address` fail.
    pub fn set_unreachable(&self, address: &str, unreachable: bool) {
        let mut set = self.unreachable.lock();
        if unreachable {
            set.insert(address.to_string());
        } else {
            set.remove(address);
        }
    }

    /// Connecting to `address` fails.
    pub fn set_refusing(&self, address: &str, refusing: bool) {
        let mut set = self.refusing.lock();
        if refusing {
            set.insert(address.to_string());
        } else {
            set.remove(address);
        }
    }

    pub fn connect_count(&self, address: &str) -> usize {
        self.connects.lock().get(address).copied().unwrap_or(0)
    }

    pub fn closed_count(&self, address: &str) -> usize {
        self.closed.lock().get(address).copied().unwrap_or(0)
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MockConnection {
    address: NodeAddress,
    cluster: Arc<MockCluster>,
    closed: AtomicBool,
}

impl MockConnection {
    /// A handle not produced by a connector, for registry-only tests.
    pub fn detached(address: &str) -> Self {
        Self {
            address: address.parse().expect("test address"),
            cluster: MockCluster::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn address(&self) -> &NodeAddress {
        &self.address
    }

    async fn fetch_topology(&self) -> Result<Vec<TopologyRow>, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed(self.address.to_string()));
        }
        if self.cluster.topology_down.load(Ordering::SeqCst) {
            return Err(ConnectionError::Timeout(self.address.to_string()));
        }
        Ok(self.cluster.rows.lock().clone())
    }

    async fn ping(&self) -> Result<(), ConnectionError> {
        self.cluster.pings.fetch_add(1, Ordering::SeqCst);
        if self.cluster.unreachable.lock().contains(&self.address.to_string()) {
            return Err(ConnectionError::Status {
                address: self.address.to_string(),
                status: 503,
            });
        }
        Ok(())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            *self.cluster.closed.lock().entry(self.address.to_string()).or_default() += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockConnector {
    cluster: Arc<MockCluster>,
}

impl MockConnector {
    pub fn new(cluster: Arc<MockCluster>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Conn = MockConnection;

    async fn connect(&self, address: &NodeAddress) -> Result<MockConnection, ConnectionError> {
        let key = address.to_string();
        if self.cluster.refusing.lock().contains(&key) {
            return Err(ConnectionError::Status {
                address: key,
                status: 503,
            });
        }
        *self.cluster.connects.lock().entry(key).or_default() += 1;

        Ok(MockConnection {
            address: address.clone(),
            cluster: self.cluster.clone(),
            closed: AtomicBool::new(false),
        })
    }
}
