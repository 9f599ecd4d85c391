use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives progress callbacks from import workers.
///
/// Called concurrently from every worker thread, once per node and direction
/// pass; implementations should be cheap.
pub trait ImportProgress: Send + Sync {
    /// A node has been fully processed (all requested directions).
    fn node_imported(&self);

    /// `count` distinct neighbors were encoded for one node and direction.
    fn relationships_encoded(&self, count: u64);

    /// `bytes` of adjacency storage were reserved for one record.
    fn bytes_allocated(&self, bytes: u64);
}

/// An [`ImportProgress`] that discards every callback.
#[derive(Default)]
pub struct NoopProgress;

impl ImportProgress for NoopProgress {
    fn node_imported(&self) {}
    fn relationships_encoded(&self, _count: u64) {}
    fn bytes_allocated(&self, _bytes: u64) {}
}

/// A thread-safe counter-based implementation of [`ImportProgress`].
#[derive(Default, Debug)]
pub struct CounterProgress {
    /// Nodes processed.
    pub nodes: AtomicU64,

    /// Encoded neighbor entries across all directions.
    pub relationships: AtomicU64,

    /// Adjacency bytes reserved.
    pub bytes: AtomicU64,
}

impl ImportProgress for CounterProgress {
    fn node_imported(&self) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }

    fn relationships_encoded(&self, count: u64) {
        self.relationships.fetch_add(count, Ordering::Relaxed);
    }

    fn bytes_allocated(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// Returns the default progress sink, a [`NoopProgress`].
pub fn default_progress() -> Arc<dyn ImportProgress> {
    Arc::new(NoopProgress)
}
