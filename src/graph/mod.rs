//! The immutable graph produced by an import.
//!
//! Holds one [`AdjacencyList`] per loaded direction (a single merged list for
//! undirected graphs), the node id mapping, and the weight table. Safe to
//! read from many algorithm threads at once.

mod adjacency;
/// Original to compact node id translation.
pub mod id_map;
/// Edge weight storage.
pub mod weights;

pub use adjacency::{AdjacencyCursor, AdjacencyList, NO_ADJACENCY};
pub use id_map::{IdMap, IdMapping};
pub use weights::{WeightMap, DEFAULT_WEIGHT_SHARDS};

use crate::source::Dir;

/// Compressed, read-only graph.
#[derive(Debug)]
pub struct HugeGraph<M = IdMap> {
    id_map: M,
    weights: WeightMap,
    undirected: bool,
    outgoing: Option<AdjacencyList>,
    incoming: Option<AdjacencyList>,
}

impl<M: IdMapping> HugeGraph<M> {
    pub(crate) fn new(
        id_map: M,
        weights: WeightMap,
        undirected: bool,
        outgoing: Option<AdjacencyList>,
        incoming: Option<AdjacencyList>,
    ) -> Self {
        Self {
            id_map,
            weights,
            undirected,
            outgoing,
            incoming,
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> u64 {
        self.id_map.node_count()
    }

    /// Whether both traversal directions share one merged adjacency list.
    pub fn is_undirected(&self) -> bool {
        self.undirected
    }

    /// Compact id of an original node id.
    pub fn to_compact(&self, original: u64) -> Option<u64> {
        self.id_map.to_compact(original)
    }

    /// Original id of a compact node id.
    pub fn to_original(&self, compact: u64) -> u64 {
        self.id_map.to_original(compact)
    }

    /// The node id mapping.
    pub fn id_map(&self) -> &M {
        &self.id_map
    }

    /// The weight table.
    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    /// Outgoing (or, for undirected graphs, merged) adjacency, if loaded.
    pub fn outgoing(&self) -> Option<&AdjacencyList> {
        self.outgoing.as_ref()
    }

    /// Incoming adjacency, if loaded.
    pub fn incoming(&self) -> Option<&AdjacencyList> {
        self.incoming.as_ref()
    }

    /// Number of distinct neighbors of `node` in `dir`.
    ///
    /// Directions that were not loaded contribute zero.
    pub fn degree(&self, node: u64, dir: Dir) -> usize {
        let (first, second) = self.lists(dir);
        first.map_or(0, |list| list.degree(node)) + second.map_or(0, |list| list.degree(node))
    }

    /// Neighbors of `node` in `dir`, ascending within each direction.
    ///
    /// `Dir::Both` on a directed graph yields outgoing then incoming neighbors.
    pub fn neighbors(&self, node: u64, dir: Dir) -> impl Iterator<Item = u64> + '_ {
        let (first, second) = self.lists(dir);
        let first = first.map_or_else(AdjacencyCursor::empty, |list| list.cursor(node));
        let second = second.map_or_else(AdjacencyCursor::empty, |list| list.cursor(node));
        first.chain(second)
    }

    /// Calls `visit(target, weight)` for each neighbor of `node` in `dir`.
    ///
    /// Weights are resolved in the stored orientation of each relationship.
    pub fn for_each_relationship(&self, node: u64, dir: Dir, mut visit: impl FnMut(u64, f64)) {
        if self.undirected {
            for target in self.merged_cursor(node) {
                visit(target, self.weight(node, target));
            }
            return;
        }
        if dir.includes_out() {
            if let Some(list) = &self.outgoing {
                for target in list.cursor(node) {
                    visit(target, self.weights.get(node, target));
                }
            }
        }
        if dir.includes_in() {
            if let Some(list) = &self.incoming {
                for target in list.cursor(node) {
                    visit(target, self.weights.get(target, node));
                }
            }
        }
    }

    /// Whether `target` is a neighbor of `source` in `dir`.
    pub fn exists(&self, source: u64, target: u64, dir: Dir) -> bool {
        let (first, second) = self.lists(dir);
        [first, second].into_iter().flatten().any(|list| {
            list.cursor(source)
                .take_while(|&neighbor| neighbor <= target)
                .any(|neighbor| neighbor == target)
        })
    }

    /// Weight of the relationship from `source` to `target`.
    ///
    /// Undirected graphs accept either orientation. Pairs without a stored
    /// weight resolve to the configured default.
    pub fn weight(&self, source: u64, target: u64) -> f64 {
        if self.undirected {
            self.weights.get(source.min(target), source.max(target))
        } else {
            self.weights.get(source, target)
        }
    }

    /// Approximate heap usage in bytes, excluding the id mapping.
    pub fn memory_usage(&self) -> usize {
        self.outgoing.as_ref().map_or(0, AdjacencyList::memory_usage)
            + self.incoming.as_ref().map_or(0, AdjacencyList::memory_usage)
            + self.weights.memory_usage()
    }

    fn merged_cursor(&self, node: u64) -> AdjacencyCursor<'_> {
        self.outgoing
            .as_ref()
            .map_or_else(AdjacencyCursor::empty, |list| list.cursor(node))
    }

    fn lists(&self, dir: Dir) -> (Option<&AdjacencyList>, Option<&AdjacencyList>) {
        if self.undirected {
            return (self.outgoing.as_ref(), None);
        }
        let out = if dir.includes_out() {
            self.outgoing.as_ref()
        } else {
            None
        };
        let inc = if dir.includes_in() {
            self.incoming.as_ref()
        } else {
            None
        };
        (out, inc)
    }
}
