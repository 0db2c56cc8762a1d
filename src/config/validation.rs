//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse as `host:port`
//! - Validate value ranges (intervals, timeouts, capacities > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use tokio::sync::Semaphore;

use crate::config::schema::RouterConfig;
use crate::endpoint::NodeAddress;

/// A single semantic violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint and collect all violations.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.bootstrap.address.parse::<NodeAddress>() {
        errors.push(ValidationError::new("bootstrap.address", e.to_string()));
    }
    if config.bootstrap.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("bootstrap.connect_timeout_ms", "must be greater than 0"));
    }

    let max_connections = config.endpoint.max_connections_per_instance;
    if max_connections == 0 {
        errors.push(ValidationError::new(
            "endpoint.max_connections_per_instance",
            "must be greater than 0",
        ));
    } else if max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::new(
            "endpoint.max_connections_per_instance",
            format!("must not exceed {}", Semaphore::MAX_PERMITS),
        ));
    }
    if config.endpoint.request_timeout_ms == 0 {
        errors.push(ValidationError::new("endpoint.request_timeout_ms", "must be greater than 0"));
    }
    if !config.endpoint.topology_path.starts_with('/') {
        errors.push(ValidationError::new("endpoint.topology_path", "must start with '/'"));
    }
    if !config.endpoint.ping_path.starts_with('/') {
        errors.push(ValidationError::new("endpoint.ping_path", "must start with '/'"));
    }

    if config.topology.poll_interval_ms == 0 {
        errors.push(ValidationError::new("topology.poll_interval_ms", "must be greater than 0"));
    }
    if config.topology.event_queue_capacity == 0 {
        errors.push(ValidationError::new(
            "topology.event_queue_capacity",
            "must be greater than 0",
        ));
    }
    if let Some(service) = &config.topology.service_address {
        if let Err(e) = service.parse::<NodeAddress>() {
            errors.push(ValidationError::new("topology.service_address", e.to_string()));
        }
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "must not be empty when admin is enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RouterConfig::default();
        config.bootstrap.address = "missing-port".into();
        config.topology.event_queue_capacity = 0;
        config.topology.service_address = Some("host:notaport".into());
        config.endpoint.ping_path = "ping".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "bootstrap.address",
                "endpoint.ping_path",
                "topology.event_queue_capacity",
                "topology.service_address",
            ]
        );
    }

    #[test]
    fn test_connection_limit_bounds() {
        let mut config = RouterConfig::default();
        config.endpoint.max_connections_per_instance = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "endpoint.max_connections_per_instance");

        config.endpoint.max_connections_per_instance = Semaphore::MAX_PERMITS + 1;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.starts_with("must not exceed"));
    }
}
