//! Topology poller.
//!
//! # Responsibilities
//! - Query the topology through one endpoint on a fixed interval
//! - Parse rows into `(address, state)` entries
//! - Feed changes from the [`ChangeFilter`] into the bounded event channel
//!
//! # Design Decisions
//! - A failed or malformed tick is logged and skipped
//! - `send` awaits when the channel is full; events are never dropped
//! - Shutdown is checked before every tick; leaving the loop closes the channel

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::endpoint::Connection;
use crate::error::TopologyError;
use crate::observability::metrics;
use crate::registry::ConnectionRegistry;
use crate::topology::filter::ChangeFilter;
use crate::topology::types::{TopologyEntry, TopologyEvent};

/// Query `conn` for the full topology snapshot.
pub async fn query_topology<C: Connection>(conn: &C) -> Result<Vec<TopologyEntry>, TopologyError> {
    let rows = conn.fetch_topology().await?;
    rows.iter().map(|row| row.parse()).collect()
}

pub struct TopologyPoller<C: Connection> {
    registry: Arc<ConnectionRegistry<C>>,
    /// Dedicated out-of-band connection, used instead of a registry endpoint.
    service: Option<Arc<C>>,
    filter: ChangeFilter,
    interval: Duration,
}

impl<C: Connection> TopologyPoller<C> {
    pub fn new(
        registry: Arc<ConnectionRegistry<C>>,
        service: Option<Arc<C>>,
        filter: ChangeFilter,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            service,
            filter,
            interval,
        }
    }

    /// Fetch one snapshot.
    pub async fn poll_once(&self) -> Result<Vec<TopologyEntry>, TopologyError> {
        match &self.service {
            Some(service) => query_topology(service.as_ref()).await,
            None => {
                let endpoint = self.registry.peek().map_err(|_| TopologyError::NoSource)?;
                query_topology(endpoint.handle()).await
            }
        }
    }

    /// Fetch one snapshot and reduce it to events.
    pub async fn tick(&mut self) -> Result<Vec<TopologyEvent>, TopologyError> {
        let snapshot = self.poll_once().await?;
        Ok(self.filter.filter_new_or_updated(snapshot))
    }

    pub async fn run(
        mut self,
        events: mpsc::Sender<TopologyEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Topology poller starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Topology poller received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let changes = match self.tick().await {
                Ok(changes) => changes,
                Err(e) => {
                    tracing::error!(error = %e, "Topology poll failed, retrying next tick");
                    metrics::record_poll_failure();
                    continue;
                }
            };

            for event in changes {
                tracing::debug!(address = %event.address, state = %event.state, "Topology change");
                metrics::record_topology_event(event.state.as_str());
                if events.send(event).await.is_err() {
                    tracing::warn!("Topology manager is gone, stopping poller");
                    return;
                }
            }
        }
    }
}
