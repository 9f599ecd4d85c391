use rustc_hash::FxHashMap;

use crate::primitives::huge::HugeLongArray;

/// Translation between sparse original node ids and dense compact ids `0..node_count`.
///
/// Must be fully populated before relationship import starts; it is only read
/// (concurrently) while workers run.
pub trait IdMapping: Sync {
    /// Compact id of `original`, or `None` if the node is excluded from the graph.
    fn to_compact(&self, original: u64) -> Option<u64>;

    /// Original id of a compact id in `0..node_count`.
    fn to_original(&self, compact: u64) -> u64;

    /// Number of nodes in the imported graph.
    fn node_count(&self) -> u64;
}

/// Dense id map assigning compact ids in insertion order.
#[derive(Debug)]
pub struct IdMap {
    originals: HugeLongArray,
    compact: FxHashMap<u64, u64>,
}

impl IdMap {
    /// Builds a map from original ids; repeated ids keep their first compact id.
    pub fn from_original_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let mut compact: FxHashMap<u64, u64> = FxHashMap::default();
        let mut ordered = Vec::new();
        for original in ids {
            let next = ordered.len() as u64;
            compact.entry(original).or_insert_with(|| {
                ordered.push(original);
                next
            });
        }
        let originals = HugeLongArray::allocate(ordered.len() as u64);
        for (idx, original) in ordered.into_iter().enumerate() {
            originals.set(idx as u64, original);
        }
        Self { originals, compact }
    }

    /// Returns `true` if `original` is part of the graph.
    pub fn contains(&self, original: u64) -> bool {
        self.compact.contains_key(&original)
    }

    /// Approximate heap usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.originals.memory_usage()
            + self.compact.capacity() * (2 * std::mem::size_of::<u64>() + 1)
    }
}

impl IdMapping for IdMap {
    #[inline]
    fn to_compact(&self, original: u64) -> Option<u64> {
        self.compact.get(&original).copied()
    }

    #[inline]
    fn to_original(&self, compact: u64) -> u64 {
        self.originals.get(compact)
    }

    fn node_count(&self) -> u64 {
        self.originals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_dense_ids_in_order() {
        let map = IdMap::from_original_ids([900, 17, 42, 17]);
        assert_eq!(map.node_count(), 3);
        assert_eq!(map.to_compact(900), Some(0));
        assert_eq!(map.to_compact(17), Some(1));
        assert_eq!(map.to_compact(42), Some(2));
        assert_eq!(map.to_compact(5), None);
        assert_eq!(map.to_original(2), 42);
        assert!(map.contains(17));
        assert!(!map.contains(5));
    }
}
