//! Random balance strategy.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::balancer::BalanceStrategy;

/// Uniform random selector.
///
/// Each call draws a fresh index and records it in the shared counter.
/// The previous draw is never returned, since the collection may have shrunk
/// since it was taken.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomStrategy;

impl RandomStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl BalanceStrategy for RandomStrategy {
    fn next(&self, counter: &AtomicU64, size: u64) -> u64 {
        let index = rand::thread_rng().gen_range(0..size);
        counter.store(index, Ordering::Relaxed);
        index
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
