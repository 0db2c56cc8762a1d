//! Topology-driven membership.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     discovery.rs (one-shot query, add every Online peer)
//!
//! Every poll interval:
//!     poller.rs (query topology through one endpoint)
//!     → filter.rs (drop entries whose state did not change)
//!     → bounded mpsc channel (send blocks when full)
//!     → manager.rs (single consumer, arrival order)
//!     → state_machine.rs (Online/Offline transition table)
//!     → registry add / remove
//! ```
//!
//! # Design Decisions
//! - Events are never dropped; a full queue applies backpressure to the poller
//! - Query failures skip one tick and are never fatal
//! - Only bootstrap discovery may fail the router

pub mod discovery;
pub mod filter;
pub mod manager;
pub mod poller;
pub mod state_machine;
pub mod types;

pub use filter::ChangeFilter;
pub use manager::TopologyManager;
pub use poller::TopologyPoller;
pub use state_machine::{Action, MemberState};
pub use types::{ReportedState, TopologyEntry, TopologyEvent, TopologyRow};
