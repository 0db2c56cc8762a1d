//! HTTP node client.
//!
//! # Responsibilities
//! - Open one pooled `reqwest::Client` per node
//! - Read the topology table (`GET {topology_path}`) as JSON rows
//! - Answer liveness pings (`GET {ping_path}`)
//!
//! # Design Decisions
//! - Pool size, timeouts and paths come from the base [`EndpointConfig`]
//! - `max_connections_per_instance` bounds in-flight requests per node with a
//!   semaphore; reqwest itself only caps idle connections
//! - Closing only flips a flag; in-flight callers finish, new calls fail fast

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

use crate::config::EndpointConfig;
use crate::endpoint::{Connection, Connector, NodeAddress};
use crate::error::ConnectionError;
use crate::topology::TopologyRow;

/// Builds [`HttpNode`] handles from the base endpoint configuration.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    config: EndpointConfig,
    connect_timeout: Duration,
}

impl HttpConnector {
    pub fn new(config: EndpointConfig, connect_timeout: Duration) -> Self {
        Self {
            config,
            connect_timeout,
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Conn = HttpNode;

    async fn connect(&self, address: &NodeAddress) -> Result<HttpNode, ConnectionError> {
        let build_error = |reason: String| ConnectionError::Build {
            address: address.to_string(),
            reason,
        };

        let base_url =
            Url::parse(&format!("http://{}", address)).map_err(|e| build_error(e.to_string()))?;
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(self.config.max_connections_per_instance)
            .connect_timeout(self.connect_timeout)
            .timeout(Duration::from_millis(self.config.request_timeout_ms))
            .no_proxy()
            .build()
            .map_err(|e| build_error(e.to_string()))?;

        tracing::debug!(address = %address, "Opened node client");

        Ok(HttpNode {
            address: address.clone(),
            base_url,
            client,
            topology_path: self.config.topology_path.clone(),
            ping_path: self.config.ping_path.clone(),
            permits: Arc::new(Semaphore::new(self.config.max_connections_per_instance)),
            closed: AtomicBool::new(false),
        })
    }
}

/// Pooled HTTP client bound to one node.
#[derive(Debug)]
pub struct HttpNode {
    address: NodeAddress,
    /// Pre-calculated base URL.
    base_url: Url,
    client: reqwest::Client,
    topology_path: String,
    ping_path: String,
    /// One permit per request allowed in flight.
    permits: Arc<Semaphore>,
    closed: AtomicBool,
}

impl HttpNode {
    /// Base URL of the node (`http://host:port/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Underlying pooled client, for callers issuing their own requests.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Resolve `path` against the node's base URL.
    pub fn url(&self, path: &str) -> Result<Url, ConnectionError> {
        self.base_url.join(path).map_err(|e| ConnectionError::Build {
            address: self.address.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Wait for a request slot on this node.
    ///
    /// Callers issuing their own requests through [`HttpNode::client`] should
    /// hold the permit for the duration of the request.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, ConnectionError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ConnectionError::Closed(self.address.to_string()))
    }

    /// Request slots currently free.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed(self.address.to_string()));
        }

        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Status {
                address: self.address.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn request_error(&self, e: reqwest::Error) -> ConnectionError {
        if e.is_timeout() {
            ConnectionError::Timeout(self.address.to_string())
        } else {
            ConnectionError::Request {
                address: self.address.to_string(),
                source: e,
            }
        }
    }
}

#[async_trait]
impl Connection for HttpNode {
    fn address(&self) -> &NodeAddress {
        &self.address
    }

    async fn fetch_topology(&self) -> Result<Vec<TopologyRow>, ConnectionError> {
        let _permit = self.acquire().await?;
        let response = self.get(&self.topology_path).await?;
        response
            .json::<Vec<TopologyRow>>()
            .await
            .map_err(|e| ConnectionError::Decode {
                address: self.address.to_string(),
                reason: e.to_string(),
            })
    }

    async fn ping(&self) -> Result<(), ConnectionError> {
        let _permit = self.acquire().await?;
        self.get(&self.ping_path).await.map(|_| ())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.permits.close();
            tracing::debug!(address = %self.address, "Closed node client");
        }
    }
}
