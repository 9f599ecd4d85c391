//! Per-node neighbor collection and delta encoding.
//!
//! A [`DeltaEncoder`] is reused for every node a worker processes: `reset`,
//! `visit` each relationship, `apply_delta`, then write the record.

use crate::graph::{IdMapping, WeightMap};
use crate::primitives::bytes::var;
use crate::primitives::huge::BulkAdder;
use crate::source::{Dir, Relationship, RelationshipSource};
use crate::types::{PropId, Result};

/// Bytes taken by the neighbor count at the head of every record.
pub const RECORD_HEADER_LEN: u64 = 4;

/// Collects one node's neighbors and turns them into strictly increasing deltas.
pub struct DeltaEncoder<'a, M> {
    id_map: &'a M,
    dir: Dir,
    source_node: u64,
    targets: Vec<u64>,
    prev_target: u64,
    sorted: bool,
    weights: Option<WeightCapture<'a>>,
}

impl<'a, M: IdMapping> DeltaEncoder<'a, M> {
    /// Creates an encoder taking neighbors from relationships scanned in `dir`.
    pub fn new(id_map: &'a M, dir: Dir) -> Self {
        Self {
            id_map,
            dir,
            source_node: 0,
            targets: Vec::new(),
            prev_target: 0,
            sorted: true,
            weights: None,
        }
    }

    /// Also captures a weight for every retained relationship.
    pub fn with_weights(mut self, capture: WeightCapture<'a>) -> Self {
        self.weights = Some(capture);
        self
    }

    /// Starts a new node, keeping the buffer allocation.
    pub fn reset(&mut self, degree: usize, source_node: u64) {
        self.source_node = source_node;
        self.targets.clear();
        self.targets.reserve(degree);
        self.prev_target = 0;
        self.sorted = true;
    }

    /// Changes which endpoint is taken as the neighbor.
    ///
    /// `Dir::Out` takes the end node, `Dir::In` the start node.
    pub fn set_direction(&mut self, dir: Dir) {
        self.dir = dir;
    }

    /// Adds the neighbor on the far side of `rel`.
    ///
    /// Neighbors missing from the id mapping are dropped; `Ok(None)` reports that.
    pub fn visit<S: RelationshipSource>(
        &mut self,
        source: &S,
        rel: &Relationship,
    ) -> Result<Option<u64>> {
        let neighbor = match self.dir {
            Dir::In => rel.start,
            Dir::Out | Dir::Both => rel.end,
        };
        let Some(target) = self.id_map.to_compact(neighbor) else {
            return Ok(None);
        };
        if self.sorted && target < self.prev_target {
            self.sorted = false;
        }
        self.prev_target = target;
        self.targets.push(target);
        if let Some(capture) = &self.weights {
            capture.capture(source, rel, self.source_node, target, self.dir)?;
        }
        Ok(Some(target))
    }

    /// Sorts if needed, collapses duplicates, and converts the buffer into deltas.
    ///
    /// Returns the encoded record size in bytes, or `0` if nothing was collected.
    pub fn apply_delta(&mut self) -> u64 {
        if self.targets.is_empty() {
            return 0;
        }
        if !self.sorted {
            self.targets.sort_unstable();
        }
        let targets = &mut self.targets;
        let mut base = targets[0];
        let mut write_pos = 1;
        let mut required = RECORD_HEADER_LEN + var::vsize(base) as u64;
        for i in 1..targets.len() {
            let next = targets[i];
            let delta = next - base;
            if delta > 0 {
                targets[write_pos] = delta;
                write_pos += 1;
                required += var::vsize(delta) as u64;
                base = next;
            }
        }
        targets.truncate(write_pos);
        required
    }

    /// Number of entries after `apply_delta`, or visited so far before it.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` when no neighbor is held.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// The delta sequence produced by `apply_delta`.
    pub fn deltas(&self) -> &[u64] {
        &self.targets
    }

    /// Writes count plus deltas into a range reserved for exactly `apply_delta()` bytes.
    pub fn write_record(&self, adder: &mut BulkAdder<'_, '_>) {
        adder.add_u32(self.targets.len() as u32);
        for &delta in &self.targets {
            adder.add_vlong(delta);
        }
    }
}

/// How a captured weight is keyed in the [`WeightMap`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeightKey {
    /// `(start, end)` of the stored relationship.
    Stored,
    /// `(min, max)`, written only while scanning the lower endpoint.
    Canonical,
}

/// Reads a relationship property and stores non-default weights.
pub struct WeightCapture<'a> {
    property: PropId,
    default: f64,
    key: WeightKey,
    weights: &'a WeightMap,
}

impl<'a> WeightCapture<'a> {
    /// Creates a capture writing into `weights`.
    pub fn new(property: PropId, default: f64, key: WeightKey, weights: &'a WeightMap) -> Self {
        Self {
            property,
            default,
            key,
            weights,
        }
    }

    fn capture<S: RelationshipSource>(
        &self,
        source: &S,
        rel: &Relationship,
        node: u64,
        target: u64,
        dir: Dir,
    ) -> Result<()> {
        let (from, to) = match self.key {
            WeightKey::Canonical if node > target => return Ok(()),
            WeightKey::Canonical => (node, target),
            WeightKey::Stored if dir == Dir::In => (target, node),
            WeightKey::Stored => (node, target),
        };
        let value = match source.property(rel.id, self.property)? {
            Some(value) => value.to_weight(self.default)?,
            None => self.default,
        };
        if value != self.default {
            self.weights.put(from, to, value);
        }
        Ok(())
    }
}
