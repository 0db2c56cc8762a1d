//! Endpoint handles.
//!
//! # Responsibilities
//! - Define the handle seam: [`Connector`] opens a [`Connection`] to one node
//! - Pair a handle with its registry address in [`Endpoint`]
//! - Provide the HTTP node client used by the binary
//!
//! # Design Decisions
//! - Handles are pooled internally; the registry only creates, holds and closes them
//! - Every handle is derived from the same base endpoint configuration

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ConnectionError, RouterError, RouterResult};
use crate::topology::TopologyRow;

pub mod address;
pub mod http;

#[cfg(test)]
pub(crate) mod mock;

pub use address::NodeAddress;
pub use http::{HttpConnector, HttpNode};

/// A pooled connection bound to one node.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Address this handle was opened for.
    fn address(&self) -> &NodeAddress;

    /// Read the full topology table as seen by this node.
    async fn fetch_topology(&self) -> Result<Vec<TopologyRow>, ConnectionError>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<(), ConnectionError>;

    /// Release the handle. Later calls fail with [`ConnectionError::Closed`].
    fn close(&self);
}

/// Factory for [`Connection`]s.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Conn: Connection;

    async fn connect(&self, address: &NodeAddress) -> Result<Self::Conn, ConnectionError>;
}

/// A tracked node address and its live handle.
#[derive(Debug)]
pub struct Endpoint<C> {
    address: String,
    handle: C,
}

impl<C: Connection> Endpoint<C> {
    pub fn new(address: impl Into<String>, handle: C) -> Self {
        Self {
            address: address.into(),
            handle,
        }
    }

    /// Registry key of this endpoint.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn handle(&self) -> &C {
        &self.handle
    }

    pub fn close(&self) {
        self.handle.close();
    }
}

/// Connect to `address` and ping it, both within `timeout`.
pub async fn open<K: Connector>(
    connector: &K,
    address: &NodeAddress,
    timeout: Duration,
) -> RouterResult<K::Conn> {
    let connect_error = |source| RouterError::Connect {
        address: address.to_string(),
        source,
    };

    let attempt = async {
        let conn = connector.connect(address).await?;
        if let Err(e) = conn.ping().await {
            conn.close();
            return Err(e);
        }
        Ok::<_, ConnectionError>(conn)
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(connect_error(e)),
        Err(_) => Err(connect_error(ConnectionError::Timeout(address.to_string()))),
    }
}
