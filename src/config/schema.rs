//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::balancer::StrategyKind;

/// Root configuration for the cluster router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Initial node used to discover the rest of the cluster.
    pub bootstrap: BootstrapConfig,

    /// Base settings every endpoint handle is derived from.
    pub endpoint: EndpointConfig,

    /// Balance strategy selection.
    pub balancer: BalancerConfig,

    /// Topology polling and membership management.
    pub topology: TopologyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Bootstrap node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Bootstrap node address (e.g., "127.0.0.1:8080").
    pub address: String,

    /// Deadline for connecting to and pinging a node during startup, in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            connect_timeout_ms: 1000,
        }
    }
}

/// Base endpoint configuration.
///
/// A handle for a newly discovered node is always built from this section,
/// including when an address is removed and later re-added.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Maximum requests in flight per node, also the idle pool size.
    pub max_connections_per_instance: usize,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Path serving the topology table.
    pub topology_path: String,

    /// Path answering liveness pings.
    pub ping_path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            max_connections_per_instance: 10,
            request_timeout_ms: 5000,
            topology_path: "/topology".to_string(),
            ping_path: "/ping".to_string(),
        }
    }
}

/// Balance strategy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Strategy used by `select` (round_robin or random).
    pub strategy: StrategyKind,
}

/// Topology management configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Run the background poller and manager.
    pub enabled: bool,

    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Capacity of the bounded event queue between poller and manager.
    pub event_queue_capacity: usize,

    /// Dedicated node to poll instead of a registry endpoint.
    pub service_address: Option<String>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 500,
            event_queue_capacity: 10,
            service_address: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
