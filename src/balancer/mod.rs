//! Balance strategies.
//!
//! # Data Flow
//! ```text
//! ConnectionRegistry::select()
//!     → shared read lock held
//!     → strategy.next(&counter, len)
//!         - round_robin.rs (advance the shared counter)
//!         - random.rs (uniform draw)
//!     → index dereferenced under the same lock
//! ```
//!
//! # Design Decisions
//! - Strategies only map `(counter, size)` to an index; the registry owns the counter
//! - The registry guards `size == 0`, strategies never see an empty collection
//! - Counter overflow wraps

use std::sync::atomic::AtomicU64;

use serde::{Deserialize, Serialize};

pub mod random;
pub mod round_robin;

pub use random::RandomStrategy;
pub use round_robin::RoundRobinStrategy;

/// Policy picking the next index into the registry.
pub trait BalanceStrategy: Send + Sync + std::fmt::Debug {
    /// Returns an index in `[0, size)`. `size` is never zero.
    fn next(&self, counter: &AtomicU64, size: u64) -> u64;

    /// Strategy identifier for logs and the admin API.
    fn name(&self) -> &'static str;
}

/// Built-in strategies selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    RoundRobin,
    Random,
}

impl StrategyKind {
    /// Instantiate the strategy.
    pub fn build(self) -> Box<dyn BalanceStrategy> {
        match self {
            StrategyKind::RoundRobin => Box::new(RoundRobinStrategy::new()),
            StrategyKind::Random => Box::new(RandomStrategy::new()),
        }
    }
}
