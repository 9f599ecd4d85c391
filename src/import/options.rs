use serde::{Deserialize, Serialize};

use crate::graph::DEFAULT_WEIGHT_SHARDS;
use crate::primitives::huge::{
    DEFAULT_BYTE_PAGE_SHIFT, DEFAULT_LONG_PAGE_SHIFT, MAX_PAGE_SHIFT, MIN_PAGE_SHIFT,
};
use crate::types::{GraphError, PropId, Result, TypeId};

/// Which adjacency lists an import produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadDirection {
    /// Outgoing adjacency only.
    Outgoing,
    /// Incoming adjacency only.
    Incoming,
    /// Separate outgoing and incoming adjacency.
    Both,
    /// One merged adjacency per node treating every relationship as undirected.
    Undirected,
}

impl LoadDirection {
    /// Whether an outgoing (or merged) list is built.
    pub fn loads_outgoing(self) -> bool {
        matches!(
            self,
            LoadDirection::Outgoing | LoadDirection::Both | LoadDirection::Undirected
        )
    }

    /// Whether a separate incoming list is built.
    pub fn loads_incoming(self) -> bool {
        matches!(self, LoadDirection::Incoming | LoadDirection::Both)
    }
}

/// Relationship property captured as edge weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightProperty {
    /// Property key read from each relationship.
    pub property: PropId,
    /// Weight assumed for relationships whose value is absent or equals this default.
    pub default: f64,
}

/// Configuration options for a graph import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Number of worker threads
    pub concurrency: usize,
    /// Adjacency lists to build
    pub direction: LoadDirection,
    /// Only import relationships of this type
    pub relationship_type: Option<TypeId>,
    /// Capture a relationship property as weight
    pub weight: Option<WeightProperty>,
    /// Weight reported when no property is configured
    pub default_weight: f64,
    /// log2 of the adjacency byte page size
    pub byte_page_shift: u32,
    /// log2 of the offsets page size (entries)
    pub long_page_shift: u32,
    /// Number of lock shards in the weight table
    pub weight_shards: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            direction: LoadDirection::Outgoing,
            relationship_type: None,
            weight: None,
            default_weight: 1.0,
            byte_page_shift: DEFAULT_BYTE_PAGE_SHIFT,
            long_page_shift: DEFAULT_LONG_PAGE_SHIFT,
            weight_shards: DEFAULT_WEIGHT_SHARDS,
        }
    }
}

impl ImportOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from TOML; omitted keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Sets the number of worker threads.
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers;
        self
    }

    /// Sets which adjacency lists to build.
    pub fn direction(mut self, direction: LoadDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Restricts the import to one relationship type.
    pub fn relationship_type(mut self, ty: TypeId) -> Self {
        self.relationship_type = Some(ty);
        self
    }

    /// Captures `property` as edge weight with the given default.
    pub fn weight(mut self, property: PropId, default: f64) -> Self {
        self.weight = Some(WeightProperty { property, default });
        self
    }

    /// Sets the page sizes of the adjacency and offsets arrays.
    pub fn page_shifts(mut self, byte_page_shift: u32, long_page_shift: u32) -> Self {
        self.byte_page_shift = byte_page_shift;
        self.long_page_shift = long_page_shift;
        self
    }

    /// Weight returned for pairs without a stored value.
    pub fn effective_default_weight(&self) -> f64 {
        self.weight.map_or(self.default_weight, |w| w.default)
    }

    /// Checks that the options describe a runnable import.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(GraphError::Invalid("concurrency must be at least 1"));
        }
        let shifts = MIN_PAGE_SHIFT..=MAX_PAGE_SHIFT;
        if !shifts.contains(&self.byte_page_shift) || !shifts.contains(&self.long_page_shift) {
            return Err(GraphError::Invalid("page shift out of range"));
        }
        if self.weight_shards == 0 {
            return Err(GraphError::Invalid("weight table needs at least one shard"));
        }
        Ok(())
    }
}
