//! Round-robin balance strategy.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::balancer::BalanceStrategy;

/// Round-robin selector.
/// Advances the shared counter and rotates through indices in ascending order.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobinStrategy;

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl BalanceStrategy for RoundRobinStrategy {
    fn next(&self, counter: &AtomicU64, size: u64) -> u64 {
        // fetch_add wraps on overflow and returns the pre-increment value.
        counter.fetch_add(1, Ordering::Relaxed) % size
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
