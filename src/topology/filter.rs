//! Change filter: reduces topology snapshots to events.

use std::collections::HashMap;

use crate::topology::types::{ReportedState, TopologyEntry, TopologyEvent};

/// Remembers the last reported state per address and passes on changes only.
///
/// The table never shrinks; an address that goes Offline stays tracked.
#[derive(Debug)]
pub struct ChangeFilter {
    known: HashMap<String, ReportedState>,
}

impl ChangeFilter {
    /// Seed the table with the bootstrap address marked Online.
    pub fn new(bootstrap_address: &str) -> Self {
        let mut known = HashMap::new();
        known.insert(bootstrap_address.to_string(), ReportedState::Online);
        Self { known }
    }

    /// Return the entries that are new or whose state changed, recording them.
    pub fn filter_new_or_updated(&mut self, snapshot: Vec<TopologyEntry>) -> Vec<TopologyEvent> {
        let mut events = Vec::with_capacity(snapshot.len());

        for entry in snapshot {
            if self.known.get(&entry.address) == Some(&entry.state) {
                continue;
            }
            self.known.insert(entry.address.clone(), entry.state.clone());
            events.push(TopologyEvent::from(entry));
        }

        events
    }

    pub fn known_state(&self, address: &str) -> Option<&ReportedState> {
        self.known.get(address)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
