//! Topology manager: applies membership events to the registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::endpoint::Connector;
use crate::error::TransitionError;
use crate::observability::metrics;
use crate::registry::ConnectionRegistry;
use crate::topology::state_machine::{transition, Action, MemberState};
use crate::topology::types::TopologyEvent;

/// Single consumer of the event channel.
///
/// Keeps one [`MemberState`] per tracked address. Addresses present in the
/// registry at construction start Online; unseen addresses start Offline.
pub struct TopologyManager<K: Connector> {
    registry: Arc<ConnectionRegistry<K::Conn>>,
    connector: Arc<K>,
    states: HashMap<String, MemberState>,
}

impl<K: Connector> TopologyManager<K> {
    pub fn new(registry: Arc<ConnectionRegistry<K::Conn>>, connector: Arc<K>) -> Self {
        let states = registry
            .addresses()
            .into_iter()
            .map(|address| (address, MemberState::Online))
            .collect();

        Self {
            registry,
            connector,
            states,
        }
    }

    /// Current state of `address`, if it was ever tracked.
    pub fn state(&self, address: &str) -> Option<MemberState> {
        self.states.get(address).copied()
    }

    /// Apply one event and return the resulting state.
    ///
    /// Unrecognized states and failed connects leave the state unchanged.
    pub async fn apply(&mut self, event: TopologyEvent) -> Result<MemberState, TransitionError> {
        let requested = MemberState::try_from(&event.state).map_err(|state| {
            TransitionError::UnrecognizedState {
                address: event.address.clone(),
                state,
            }
        })?;

        let current = self.state(&event.address).unwrap_or(MemberState::Offline);
        let (action, next) = transition(current, requested);

        match action {
            Action::None => {}
            Action::Remove => {
                if let Some(endpoint) = self.registry.remove(&event.address) {
                    endpoint.close();
                }
                tracing::info!(address = %event.address, "Endpoint went offline, removed");
            }
            Action::Connect => {
                self.registry
                    .connect(self.connector.as_ref(), &event.address)
                    .await
                    .map_err(|source| TransitionError::Connect {
                        address: event.address.clone(),
                        source,
                    })?;
                tracing::info!(address = %event.address, "Endpoint came online, added");
            }
        }

        if next != current {
            metrics::record_transition(next.as_str());
        }
        self.states.insert(event.address, next);
        Ok(next)
    }

    /// Consume events until the channel is closed and drained.
    pub async fn run(mut self, mut events: mpsc::Receiver<TopologyEvent>) {
        tracing::info!(tracked = self.states.len(), "Topology manager starting");

        while let Some(event) = events.recv().await {
            match self.apply(event).await {
                Ok(_) => {}
                Err(e @ TransitionError::UnrecognizedState { .. }) => {
                    tracing::warn!(error = %e, "Ignoring topology event");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to apply topology event");
                }
            }
        }

        tracing::info!("Event channel closed, topology manager exiting");
    }
}
