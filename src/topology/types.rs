//! Topology rows, snapshot entries and events.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TopologyError;

/// One raw row of the topology table as returned by a node.
///
/// `current_state` is either a bare state token or an array whose first
/// element is the token (e.g. `["Online", 3]`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopologyRow {
    pub address: String,
    pub current_state: Value,
}

impl TopologyRow {
    /// Extract the state token.
    pub fn parse(&self) -> Result<TopologyEntry, TopologyError> {
        let token = match &self.current_state {
            Value::String(token) => token,
            Value::Array(items) => match items.first() {
                Some(Value::String(token)) => token,
                other => return Err(self.malformed(other.map_or("empty array", json_kind))),
            },
            other => return Err(self.malformed(json_kind(other))),
        };

        Ok(TopologyEntry {
            address: self.address.clone(),
            state: ReportedState::from(token.as_str()),
        })
    }

    fn malformed(&self, found: &'static str) -> TopologyError {
        TopologyError::MalformedRow {
            address: self.address.clone(),
            found,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// State token reported by the topology source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportedState {
    Online,
    Offline,
    /// Any token other than `Online` or `Offline`.
    Unrecognized(String),
}

impl ReportedState {
    pub fn as_str(&self) -> &str {
        match self {
            ReportedState::Online => "Online",
            ReportedState::Offline => "Offline",
            ReportedState::Unrecognized(token) => token,
        }
    }
}

impl From<&str> for ReportedState {
    fn from(token: &str) -> Self {
        match token {
            "Online" => ReportedState::Online,
            "Offline" => ReportedState::Offline,
            other => ReportedState::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for ReportedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(address, state)` pair of a topology snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyEntry {
    pub address: String,
    pub state: ReportedState,
}

impl TopologyEntry {
    pub fn new(address: impl Into<String>, state: ReportedState) -> Self {
        Self {
            address: address.into(),
            state,
        }
    }
}

/// Instruction for the topology manager, consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyEvent {
    pub address: String,
    pub state: ReportedState,
}

impl From<TopologyEntry> for TopologyEvent {
    fn from(entry: TopologyEntry) -> Self {
        Self {
            address: entry.address,
            state: entry.state,
        }
    }
}
