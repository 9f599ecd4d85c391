//! Per-thread relationship import worker.

use tracing::debug;

use super::encoding::DeltaEncoder;
use super::progress::ImportProgress;
use crate::graph::IdMapping;
use crate::primitives::concurrency::NodeQueue;
use crate::primitives::huge::{ByteAllocator, HugeByteArray, HugeLongArray};
use crate::source::{Dir, RelationshipSource};
use crate::types::{Result, TypeId};

/// Output arrays of one direction plus this worker's allocator into them.
pub(crate) struct AdjacencySink<'a> {
    offsets: &'a HugeLongArray,
    allocator: ByteAllocator<'a>,
}

impl<'a> AdjacencySink<'a> {
    pub(crate) fn new(offsets: &'a HugeLongArray, adjacency: &'a HugeByteArray) -> Self {
        Self {
            offsets,
            allocator: adjacency.new_allocator(),
        }
    }
}

/// Encoder and sink for one output direction.
pub(crate) struct DirectionPass<'a, M> {
    pub(crate) dir: Dir,
    pub(crate) encoder: DeltaEncoder<'a, M>,
    pub(crate) sink: AdjacencySink<'a>,
}

/// The shape of work done per node, fixed for the whole import.
pub(crate) enum Loader<'a, M> {
    /// One direction, one pass.
    Single(DirectionPass<'a, M>),
    /// Outgoing and incoming lists built by independent passes.
    Both {
        outgoing: DirectionPass<'a, M>,
        incoming: DirectionPass<'a, M>,
    },
    /// Incoming then outgoing scans merged into one list.
    Undirected {
        encoder: DeltaEncoder<'a, M>,
        sink: AdjacencySink<'a>,
    },
}

/// Totals reported by a finished worker.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct WorkerStats {
    pub(crate) nodes: u64,
    pub(crate) relationships: u64,
    pub(crate) bytes: u64,
}

/// Drains the shared [`NodeQueue`], encoding and writing each node's adjacency.
pub(crate) struct RelationshipImporter<'a, S, M> {
    index: usize,
    source: &'a S,
    id_map: &'a M,
    queue: &'a NodeQueue,
    progress: &'a dyn ImportProgress,
    relationship_type: Option<TypeId>,
    loader: Loader<'a, M>,
    stats: WorkerStats,
}

impl<'a, S, M> RelationshipImporter<'a, S, M>
where
    S: RelationshipSource,
    M: IdMapping,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        index: usize,
        source: &'a S,
        id_map: &'a M,
        queue: &'a NodeQueue,
        progress: &'a dyn ImportProgress,
        relationship_type: Option<TypeId>,
        loader: Loader<'a, M>,
    ) -> Self {
        Self {
            index,
            source,
            id_map,
            queue,
            progress,
            relationship_type,
            loader,
            stats: WorkerStats::default(),
        }
    }

    /// Processes nodes until the queue is empty or a read fails.
    pub(crate) fn run(mut self) -> Result<WorkerStats> {
        while let Some(node) = self.queue.next() {
            let original = self.id_map.to_original(node);
            self.import_node(node, original)?;
            self.stats.nodes += 1;
            self.progress.node_imported();
        }
        debug!(
            worker = self.index,
            nodes = self.stats.nodes,
            relationships = self.stats.relationships,
            bytes = self.stats.bytes,
            "import.worker.finished"
        );
        Ok(self.stats)
    }

    fn import_node(&mut self, node: u64, original: u64) -> Result<()> {
        let ctx = NodeContext {
            source: self.source,
            progress: self.progress,
            relationship_type: self.relationship_type,
            node,
            original,
        };
        let stats = &mut self.stats;
        match &mut self.loader {
            Loader::Single(pass) => ctx.read_relationships(pass, stats),
            Loader::Both { outgoing, incoming } => {
                ctx.read_relationships(outgoing, stats)?;
                ctx.read_relationships(incoming, stats)
            }
            Loader::Undirected { encoder, sink } => {
                ctx.read_undirected_relationships(encoder, sink, stats)
            }
        }
    }
}

/// Everything one node's passes need besides the mutable encoder state.
struct NodeContext<'a, S> {
    source: &'a S,
    progress: &'a dyn ImportProgress,
    relationship_type: Option<TypeId>,
    node: u64,
    original: u64,
}

impl<S: RelationshipSource> NodeContext<'_, S> {
    fn read_relationships<M: IdMapping>(
        &self,
        pass: &mut DirectionPass<'_, M>,
        stats: &mut WorkerStats,
    ) -> Result<()> {
        let ty = self.relationship_type;
        let degree = self.source.degree(self.original, pass.dir, ty)?;
        if degree == 0 {
            return Ok(());
        }
        let encoder = &mut pass.encoder;
        encoder.reset(degree, self.node);
        let source = self.source;
        source.for_each_relationship(self.original, pass.dir, ty, &mut |rel| {
            encoder.visit(source, &rel).map(|_| ())
        })?;
        self.write(encoder, &mut pass.sink, stats);
        Ok(())
    }

    fn read_undirected_relationships<M: IdMapping>(
        &self,
        encoder: &mut DeltaEncoder<'_, M>,
        sink: &mut AdjacencySink<'_>,
        stats: &mut WorkerStats,
    ) -> Result<()> {
        let ty = self.relationship_type;
        let degree = self.source.degree(self.original, Dir::Both, ty)?;
        if degree == 0 {
            return Ok(());
        }
        encoder.reset(degree, self.node);
        let source = self.source;
        for dir in [Dir::In, Dir::Out] {
            encoder.set_direction(dir);
            source.for_each_relationship(self.original, dir, ty, &mut |rel| {
                encoder.visit(source, &rel).map(|_| ())
            })?;
        }
        self.write(encoder, sink, stats);
        Ok(())
    }

    fn write<M: IdMapping>(
        &self,
        encoder: &mut DeltaEncoder<'_, M>,
        sink: &mut AdjacencySink<'_>,
        stats: &mut WorkerStats,
    ) {
        let required = encoder.apply_delta();
        if encoder.is_empty() {
            return;
        }
        let mut adder = sink.allocator.allocate(required);
        sink.offsets.set(self.node, adder.offset());
        encoder.write_record(&mut adder);

        let count = encoder.len() as u64;
        stats.relationships += count;
        stats.bytes += required;
        self.progress.relationships_encoded(count);
        self.progress.bytes_allocated(required);
    }
}
