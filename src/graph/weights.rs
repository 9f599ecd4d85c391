use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Default number of lock shards in a [`WeightMap`].
pub const DEFAULT_WEIGHT_SHARDS: usize = 64;

/// Concurrent table of edge weights keyed by `(source, target)` compact ids.
///
/// Only weights that differ from the default are stored; lookups of absent
/// pairs return the default. A second insert for the same key replaces the
/// first.
#[derive(Debug)]
pub struct WeightMap {
    default: f64,
    shards: Vec<Mutex<FxHashMap<(u64, u64), f64>>>,
}

impl WeightMap {
    /// Creates an empty table with `shards` independently locked partitions.
    pub fn new(default: f64, shards: usize) -> Self {
        let shard_count = shards.max(1);
        let mut shard_vec = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shard_vec.push(Mutex::new(FxHashMap::default()));
        }
        Self {
            default,
            shards: shard_vec,
        }
    }

    /// Weight substituted for pairs without an entry.
    pub fn default_value(&self) -> f64 {
        self.default
    }

    /// Stores `weight` for `(source, target)`.
    pub fn put(&self, source: u64, target: u64, weight: f64) {
        self.shard_for(source, target)
            .lock()
            .insert((source, target), weight);
    }

    /// Weight of `(source, target)`, or the default when absent.
    pub fn get(&self, source: u64, target: u64) -> f64 {
        self.shard_for(source, target)
            .lock()
            .get(&(source, target))
            .copied()
            .unwrap_or(self.default)
    }

    /// Whether an explicit entry exists for `(source, target)`.
    pub fn contains(&self, source: u64, target: u64) -> bool {
        self.shard_for(source, target)
            .lock()
            .contains_key(&(source, target))
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    /// Returns `true` when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate heap usage in bytes.
    pub fn memory_usage(&self) -> usize {
        let entry = std::mem::size_of::<((u64, u64), f64)>() + 1;
        self.shards
            .iter()
            .map(|shard| shard.lock().capacity() * entry)
            .sum()
    }

    fn shard_for(&self, source: u64, target: u64) -> &Mutex<FxHashMap<(u64, u64), f64>> {
        let mixed = source.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ target;
        &self.shards[(mixed % self.shards.len() as u64) as usize]
    }
}
