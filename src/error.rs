//! Error types shared across the router.
//!
//! Synchronous registry operations return [`RouterError`] to the caller.
//! Background loops log [`TopologyError`] and [`TransitionError`] and carry on.

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Errors raised by an endpoint handle.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Transport level failure.
    #[error("request to {address} failed: {source}")]
    Request {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with a non-success status.
    #[error("{address} answered with status {status}")]
    Status { address: String, status: u16 },

    /// The node answered with a body that could not be decoded.
    #[error("failed to decode response from {address}: {reason}")]
    Decode { address: String, reason: String },

    /// The client for a node could not be built.
    #[error("failed to build client for {address}: {reason}")]
    Build { address: String, reason: String },

    #[error("connection to {0} timed out")]
    Timeout(String),

    /// The handle was closed by the registry.
    #[error("connection to {0} is closed")]
    Closed(String),
}

/// Errors produced while reading the cluster topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("topology query failed: {0}")]
    Query(#[from] ConnectionError),

    /// A row whose state field is not a state token.
    #[error("malformed topology row for {address}: state must be a string, got {found}")]
    MalformedRow { address: String, found: &'static str },

    /// Neither a service connection nor a registry endpoint was available.
    #[error("no endpoint available to query topology")]
    NoSource,
}

/// Errors produced by the per-address membership state machine.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("unrecognized state {state:?} for {address}")]
    UnrecognizedState { address: String, state: String },

    /// The Offline to Online action could not open a new handle.
    #[error("failed to bring {address} online: {source}")]
    Connect {
        address: String,
        #[source]
        source: RouterError,
    },
}

/// Errors returned to callers of the router and its registry.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The registry holds no endpoints.
    #[error("no endpoint available")]
    NoEndpointAvailable,

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: ConnectionError,
    },

    /// Startup discovery failed; no router is produced.
    #[error("bootstrap discovery failed: {0}")]
    Bootstrap(#[source] TopologyError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
