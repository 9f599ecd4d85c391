use crate::primitives::huge::{ByteReader, HugeByteArray, HugeLongArray};

/// Offset written for nodes without an adjacency record.
pub const NO_ADJACENCY: u64 = 0;

/// Offsets plus delta-encoded neighbor records for one direction.
///
/// Record layout at a node's offset: a big-endian `u32` neighbor count, then
/// that many varint deltas. The first delta is taken from zero, each later one
/// from the previous neighbor; neighbors are strictly increasing.
#[derive(Debug)]
pub struct AdjacencyList {
    offsets: HugeLongArray,
    adjacency: HugeByteArray,
}

impl AdjacencyList {
    pub(crate) fn new(offsets: HugeLongArray, adjacency: HugeByteArray) -> Self {
        Self { offsets, adjacency }
    }

    /// Per-node record offsets.
    pub fn offsets(&self) -> &HugeLongArray {
        &self.offsets
    }

    /// Encoded records.
    pub fn adjacency(&self) -> &HugeByteArray {
        &self.adjacency
    }

    /// Number of distinct neighbors of `node`.
    pub fn degree(&self, node: u64) -> usize {
        match self.offsets.get(node) {
            NO_ADJACENCY => 0,
            offset => self.adjacency.reader(offset).read_u32() as usize,
        }
    }

    /// Decoding cursor over the neighbors of `node`.
    pub fn cursor(&self, node: u64) -> AdjacencyCursor<'_> {
        match self.offsets.get(node) {
            NO_ADJACENCY => AdjacencyCursor::empty(),
            offset => AdjacencyCursor::new(self.adjacency.reader(offset)),
        }
    }

    /// Approximate heap usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.offsets.memory_usage() + self.adjacency.memory_usage()
    }
}

/// Lazily decodes one adjacency record into ascending compact neighbor ids.
pub struct AdjacencyCursor<'a> {
    reader: Option<ByteReader<'a>>,
    remaining: u32,
    prev: u64,
}

impl<'a> AdjacencyCursor<'a> {
    pub(crate) fn new(mut reader: ByteReader<'a>) -> Self {
        let remaining = reader.read_u32();
        Self {
            reader: Some(reader),
            remaining,
            prev: 0,
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            reader: None,
            remaining: 0,
            prev: 0,
        }
    }
}

impl Iterator for AdjacencyCursor<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let reader = self.reader.as_mut()?;
        self.prev += reader.read_vlong();
        self.remaining -= 1;
        Some(self.prev)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for AdjacencyCursor<'_> {}
