//! Import orchestration: allocate outputs, run workers, assemble the graph.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use super::encoding::{DeltaEncoder, WeightCapture, WeightKey};
use super::importer::{AdjacencySink, DirectionPass, Loader, RelationshipImporter, WorkerStats};
use super::options::{ImportOptions, LoadDirection};
use super::progress::{default_progress, ImportProgress};
use crate::graph::{AdjacencyList, HugeGraph, IdMapping, WeightMap};
use crate::primitives::concurrency::NodeQueue;
use crate::primitives::huge::{HugeByteArray, HugeLongArray};
use crate::source::{Dir, RelationshipSource};
use crate::types::{GraphError, Result};

/// Offsets and adjacency arrays for one direction while workers fill them.
struct DirectionArrays {
    offsets: HugeLongArray,
    adjacency: HugeByteArray,
}

impl DirectionArrays {
    fn allocate(node_count: u64, options: &ImportOptions) -> Self {
        Self {
            offsets: HugeLongArray::with_page_shift(node_count, options.long_page_shift),
            adjacency: HugeByteArray::with_page_shift(0, options.byte_page_shift),
        }
    }

    fn sink(&self) -> AdjacencySink<'_> {
        AdjacencySink::new(&self.offsets, &self.adjacency)
    }

    fn into_list(self) -> AdjacencyList {
        AdjacencyList::new(self.offsets, self.adjacency)
    }
}

/// Builds a [`HugeGraph`] from a [`RelationshipSource`].
pub struct GraphFactory<'a, S> {
    source: &'a S,
    options: ImportOptions,
    progress: Arc<dyn ImportProgress>,
}

impl<'a, S: RelationshipSource> GraphFactory<'a, S> {
    /// Creates a factory reading from `source`.
    pub fn new(source: &'a S, options: ImportOptions) -> Self {
        Self {
            source,
            options,
            progress: default_progress(),
        }
    }

    /// Reports worker progress to `progress`.
    pub fn with_progress(mut self, progress: Arc<dyn ImportProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// The options this factory imports with.
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Imports every relationship of the nodes in `id_map`.
    ///
    /// Returns only after all workers have finished. If any worker fails, the
    /// first error (by worker index) is returned and no graph is produced.
    pub fn build<M: IdMapping>(&self, id_map: M) -> Result<HugeGraph<M>> {
        let options = &self.options;
        options.validate()?;
        let started = Instant::now();
        let node_count = id_map.node_count();
        let direction = options.direction;
        let outgoing = direction
            .loads_outgoing()
            .then(|| DirectionArrays::allocate(node_count, options));
        let incoming = direction
            .loads_incoming()
            .then(|| DirectionArrays::allocate(node_count, options));
        let weights = WeightMap::new(options.effective_default_weight(), options.weight_shards);

        info!(
            nodes = node_count,
            concurrency = options.concurrency,
            direction = ?direction,
            weighted = options.weight.is_some(),
            "import.relationships.started"
        );

        let stats = self.run_workers(
            &id_map,
            outgoing.as_ref(),
            incoming.as_ref(),
            &weights,
        )?;

        let relationships: u64 = stats.iter().map(|s| s.relationships).sum();
        let bytes: u64 = stats.iter().map(|s| s.bytes).sum();
        info!(
            nodes = node_count,
            relationships,
            bytes,
            weights = weights.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "import.relationships.completed"
        );

        Ok(HugeGraph::new(
            id_map,
            weights,
            direction == LoadDirection::Undirected,
            outgoing.map(DirectionArrays::into_list),
            incoming.map(DirectionArrays::into_list),
        ))
    }

    fn run_workers<M: IdMapping>(
        &self,
        id_map: &M,
        outgoing: Option<&DirectionArrays>,
        incoming: Option<&DirectionArrays>,
        weights: &WeightMap,
    ) -> Result<Vec<WorkerStats>> {
        let queue = NodeQueue::new(id_map.node_count());
        let concurrency = self.options.concurrency;
        let progress: &dyn ImportProgress = self.progress.as_ref();

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(concurrency);
            let mut first_error = None;
            for index in 0..concurrency {
                let loader = match self.loader(id_map, outgoing, incoming, weights) {
                    Ok(loader) => loader,
                    Err(err) => {
                        first_error = Some(err);
                        break;
                    }
                };
                let worker = RelationshipImporter::new(
                    index,
                    self.source,
                    id_map,
                    &queue,
                    progress,
                    self.options.relationship_type,
                    loader,
                );
                let spawned = thread::Builder::new()
                    .name(format!("graph-import-{index}"))
                    .spawn_scoped(scope, move || worker.run());
                match spawned {
                    Ok(handle) => handles.push((index, handle)),
                    Err(err) => {
                        first_error = Some(GraphError::Io(err));
                        break;
                    }
                }
            }

            let mut stats = Vec::with_capacity(handles.len());
            let mut worker_error = None;
            for (index, handle) in handles {
                match handle.join() {
                    Ok(Ok(worker_stats)) => stats.push(worker_stats),
                    Ok(Err(err)) => {
                        warn!(worker = index, error = %err, "import.worker.failed");
                        if worker_error.is_none() {
                            worker_error = Some(err);
                        }
                    }
                    Err(_) => {
                        warn!(worker = index, "import.worker.panicked");
                        if worker_error.is_none() {
                            worker_error = Some(GraphError::WorkerPanicked { worker: index });
                        }
                    }
                }
            }
            match worker_error.or(first_error) {
                Some(err) => Err(err),
                None => Ok(stats),
            }
        })
    }

    /// Builds one worker's encoders and sinks for the configured direction.
    fn loader<'w, M: IdMapping>(
        &self,
        id_map: &'w M,
        outgoing: Option<&'w DirectionArrays>,
        incoming: Option<&'w DirectionArrays>,
        weights: &'w WeightMap,
    ) -> Result<Loader<'w, M>> {
        let capture = |key: WeightKey| {
            self.options
                .weight
                .map(|w| WeightCapture::new(w.property, w.default, key, weights))
        };
        let encoder = |dir: Dir, key: Option<WeightKey>| {
            let encoder = DeltaEncoder::new(id_map, dir);
            match key.and_then(capture) {
                Some(capture) => encoder.with_weights(capture),
                None => encoder,
            }
        };

        let loader = match (self.options.direction, outgoing, incoming) {
            (LoadDirection::Undirected, Some(merged), _) => Loader::Undirected {
                encoder: encoder(Dir::In, Some(WeightKey::Canonical)),
                sink: merged.sink(),
            },
            (LoadDirection::Both, Some(out), Some(inc)) => Loader::Both {
                outgoing: DirectionPass {
                    dir: Dir::Out,
                    encoder: encoder(Dir::Out, Some(WeightKey::Stored)),
                    sink: out.sink(),
                },
                // the outgoing pass already captures each relationship's weight
                incoming: DirectionPass {
                    dir: Dir::In,
                    encoder: encoder(Dir::In, None),
                    sink: inc.sink(),
                },
            },
            (LoadDirection::Outgoing, Some(out), _) => Loader::Single(DirectionPass {
                dir: Dir::Out,
                encoder: encoder(Dir::Out, Some(WeightKey::Stored)),
                sink: out.sink(),
            }),
            (LoadDirection::Incoming, _, Some(inc)) => Loader::Single(DirectionPass {
                dir: Dir::In,
                encoder: encoder(Dir::In, Some(WeightKey::Stored)),
                sink: inc.sink(),
            }),
            _ => {
                return Err(GraphError::Invalid(
                    "adjacency arrays do not match the load direction",
                ))
            }
        };
        Ok(loader)
    }
}
