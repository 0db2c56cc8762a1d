//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_registry_endpoints` (gauge): endpoints currently in the registry
//! - `router_topology_events_total` (counter): events emitted by the change filter, by state
//! - `router_topology_poll_failures_total` (counter): skipped poll ticks
//! - `router_endpoint_transitions_total` (counter): applied state transitions, by target state
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_registry_size(endpoints: usize) {
    metrics::gauge!("router_registry_endpoints").set(endpoints as f64);
}

pub fn record_topology_event(state: &str) {
    metrics::counter!("router_topology_events_total", "state" => state.to_string()).increment(1);
}

pub fn record_poll_failure() {
    metrics::counter!("router_topology_poll_failures_total").increment(1);
}

pub fn record_transition(to: &'static str) {
    metrics::counter!("router_endpoint_transitions_total", "to" => to).increment(1);
}
