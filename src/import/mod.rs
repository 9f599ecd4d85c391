//! Parallel relationship import.
//!
//! [`GraphFactory`] splits the compact node id space over worker threads via a
//! shared [`NodeQueue`](crate::primitives::concurrency::NodeQueue). Each worker
//! reads a node's relationships from the source, delta-encodes the neighbor
//! ids, reserves an exact-size range of the adjacency array, and records the
//! offset. Weighted imports also fill the graph's weight table.

pub mod encoding;
pub mod factory;
mod importer;
/// Import configuration.
pub mod options;
/// Progress callbacks for running imports.
pub mod progress;

pub use encoding::{DeltaEncoder, WeightCapture, WeightKey, RECORD_HEADER_LEN};
pub use factory::GraphFactory;
pub use options::{ImportOptions, LoadDirection, WeightProperty};
pub use progress::{default_progress, CounterProgress, ImportProgress, NoopProgress};
