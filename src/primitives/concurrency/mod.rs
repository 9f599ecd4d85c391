//! Scheduling primitives shared by import workers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Dispenses node ids `0..bound` one at a time to competing workers.
///
/// Every id is handed out exactly once, in increasing order across the
/// whole queue. Workers pull single nodes so that a high-degree node stalls
/// only the worker that drew it.
#[derive(Debug)]
pub struct NodeQueue {
    current: AtomicU64,
    bound: u64,
}

impl NodeQueue {
    /// Creates a queue over `[0, bound)`.
    pub fn new(bound: u64) -> Self {
        Self {
            current: AtomicU64::new(0),
            bound,
        }
    }

    /// Claims the next node id, or `None` once the queue is drained.
    #[inline]
    pub fn next(&self) -> Option<u64> {
        let node = self.current.fetch_add(1, Ordering::Relaxed);
        (node < self.bound).then_some(node)
    }

    /// Exclusive upper bound of dispensed ids.
    pub fn bound(&self) -> u64 {
        self.bound
    }
}
