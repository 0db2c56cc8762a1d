//! Bootstrap discovery.
//!
//! One-shot at startup: read the topology through the bootstrap endpoint and
//! add every Online peer. Any failure here is fatal to router construction.

use std::time::Duration;

use crate::endpoint::{self, Connector, NodeAddress};
use crate::error::{RouterError, RouterResult, TopologyError};
use crate::registry::ConnectionRegistry;
use crate::topology::poller::query_topology;
use crate::topology::types::ReportedState;

/// Populate `registry` with the Online peers reported by `bootstrap`.
///
/// `bootstrap` must already be registered. Returns the number of peers added.
pub async fn discover<K: Connector>(
    registry: &ConnectionRegistry<K::Conn>,
    connector: &K,
    bootstrap: &str,
    connect_timeout: Duration,
) -> RouterResult<usize> {
    let source = registry
        .get(bootstrap)
        .ok_or(RouterError::Bootstrap(TopologyError::NoSource))?;
    let snapshot = query_topology(source.handle()).await.map_err(RouterError::Bootstrap)?;

    let mut added = 0;
    for entry in snapshot {
        if entry.state != ReportedState::Online || entry.address == bootstrap {
            continue;
        }

        let address: NodeAddress = entry.address.parse()?;
        let handle = endpoint::open(connector, &address, connect_timeout).await?;
        if let Some(old) = registry.add(&entry.address, handle)? {
            old.close();
        }
        tracing::debug!(address = %entry.address, "Discovered peer");
        added += 1;
    }

    tracing::info!(bootstrap = %bootstrap, peers = added, "Bootstrap discovery complete");
    Ok(added)
}
