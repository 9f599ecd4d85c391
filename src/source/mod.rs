//! The relationship store the importer reads from.
//!
//! The importer only ever asks three things of a store: how many
//! relationships a node has in a direction, the relationships themselves,
//! and (when weights are captured) one property of a relationship.

use std::fmt;

use crate::types::{GraphError, PropId, RelationshipId, Result, TypeId};

pub mod csv;
pub mod memory;

pub use memory::{MemorySource, MemorySourceBuilder};

/// Traversal direction relative to the node being scanned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Dir {
    /// Relationships starting at the node.
    Out,
    /// Relationships ending at the node.
    In,
    /// Both of the above.
    Both,
}

impl Dir {
    /// Whether outgoing relationships are included.
    pub fn includes_out(self) -> bool {
        matches!(self, Dir::Out | Dir::Both)
    }

    /// Whether incoming relationships are included.
    pub fn includes_in(self) -> bool {
        matches!(self, Dir::In | Dir::Both)
    }

    /// Lowercase name used in logs and config.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Out => "out",
            Dir::In => "in",
            Dir::Both => "both",
        }
    }
}

/// A relationship as reported by the source, in its stored orientation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Relationship {
    /// Relationship identifier, used for property lookups.
    pub id: RelationshipId,
    /// Original id of the start node.
    pub start: u64,
    /// Original id of the end node.
    pub end: u64,
}

/// Property value read from the relationship source.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Owned byte vector.
    Bytes(Vec<u8>),
}

impl PropValue {
    /// Converts the value to an edge weight.
    ///
    /// Numbers convert directly, non-empty text is parsed as a float (failing
    /// on malformed text), `true` is `1.0`; everything else is `default`.
    pub fn to_weight(&self, default: f64) -> Result<f64> {
        match self {
            PropValue::Int(v) => Ok(*v as f64),
            PropValue::Float(v) => Ok(*v),
            PropValue::Str(s) if !s.is_empty() => {
                s.trim()
                    .parse::<f64>()
                    .map_err(|err| GraphError::PropertyConversion {
                        value: s.clone(),
                        reason: err.to_string(),
                    })
            }
            PropValue::Bool(true) => Ok(1.0),
            _ => Ok(default),
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Str(v) => write!(f, "{v}"),
            PropValue::Bytes(v) => write!(f, "bytes(len={})", v.len()),
        }
    }
}

/// Read access to the relationship store during import.
///
/// Node ids passed in are original (store) ids. `degree` is a sizing hint and
/// must agree with what `for_each_relationship` yields for the same arguments.
/// Implementations must tolerate concurrent calls from every import worker.
pub trait RelationshipSource: Sync {
    /// Number of relationships of `node` in `dir`, optionally restricted to one type.
    fn degree(&self, node: u64, dir: Dir, ty: Option<TypeId>) -> Result<usize>;

    /// Feeds each relationship of `node` in `dir` to `visit`, stopping at the first error.
    fn for_each_relationship(
        &self,
        node: u64,
        dir: Dir,
        ty: Option<TypeId>,
        visit: &mut dyn FnMut(Relationship) -> Result<()>,
    ) -> Result<()>;

    /// Reads property `key` of relationship `rel`; `None` when absent.
    fn property(&self, rel: RelationshipId, key: PropId) -> Result<Option<PropValue>>;
}
