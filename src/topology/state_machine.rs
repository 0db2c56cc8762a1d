//! Per-address membership state machine.
//!
//! # State Transitions
//! ```text
//! | current | event   | action  | next    |
//! |---------|---------|---------|---------|
//! | Online  | Online  | none    | Online  |
//! | Online  | Offline | remove  | Offline |
//! | Offline | Online  | connect | Online  |
//! | Offline | Offline | none    | Offline |
//! ```
//!
//! Events outside `{Online, Offline}` never reach the table; they are
//! rejected when converted into a [`MemberState`].

use crate::topology::types::ReportedState;

/// Membership state of one tracked address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberState {
    Online,
    Offline,
}

impl MemberState {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberState::Online => "online",
            MemberState::Offline => "offline",
        }
    }
}

impl TryFrom<&ReportedState> for MemberState {
    /// The unrecognized token.
    type Error = String;

    fn try_from(state: &ReportedState) -> Result<Self, Self::Error> {
        match state {
            ReportedState::Online => Ok(MemberState::Online),
            ReportedState::Offline => Ok(MemberState::Offline),
            ReportedState::Unrecognized(token) => Err(token.clone()),
        }
    }
}

/// Side effect of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Open a new handle and add it to the registry.
    Connect,
    /// Remove the endpoint from the registry and close its handle.
    Remove,
}

/// Look up `(current, event)` in the transition table.
pub fn transition(current: MemberState, event: MemberState) -> (Action, MemberState) {
    use MemberState::{Offline, Online};

    match (current, event) {
        (Online, Online) => (Action::None, Online),
        (Online, Offline) => (Action::Remove, Offline),
        (Offline, Online) => (Action::Connect, Online),
        (Offline, Offline) => (Action::None, Offline),
    }
}
