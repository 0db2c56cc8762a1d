//! Shared mock cluster for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Topology table shared by every node of a mock cluster.
#[derive(Clone, Default)]
pub struct MockTopology {
    rows: Arc<Mutex<Vec<Value>>>,
}

impl MockTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table with `(address, state)` pairs.
    pub fn set(&self, rows: &[(SocketAddr, &str)]) {
        *self.rows.lock() = rows
            .iter()
            .map(|(addr, state)| {
                json!({ "address": addr.to_string(), "current_state": [state, 1] })
            })
            .collect();
    }
}

#[derive(Clone)]
struct NodeState {
    topology: MockTopology,
    healthy: Arc<AtomicBool>,
}

/// A running mock node.
pub struct MockNode {
    pub addr: SocketAddr,
    healthy: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockNode {
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

/// Start a node on an ephemeral port serving `/topology` and `/ping`.
pub async fn start_mock_node(topology: MockTopology) -> MockNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let healthy = Arc::new(AtomicBool::new(true));

    let app = Router::new()
        .route("/topology", get(topology_handler))
        .route("/ping", get(ping_handler))
        .with_state(NodeState {
            topology,
            healthy: healthy.clone(),
        });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockNode { addr, healthy }
}

async fn topology_handler(State(state): State<NodeState>) -> Json<Vec<Value>> {
    Json(state.topology.rows.lock().clone())
}

async fn ping_handler(State(state): State<NodeState>) -> StatusCode {
    if state.healthy.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Poll `check` until it holds or five seconds pass.
pub async fn wait_for(mut check: impl FnMut() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
