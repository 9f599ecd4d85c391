#![forbid(unsafe_code)]
//! Identifier newtypes and the crate-wide error type.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a relationship in the relationship source.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct RelationshipId(pub u64);

/// Relationship type identifier used for degree/iteration filtering.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
pub struct TypeId(pub u32);

/// Property key identifier.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
pub struct PropId(pub u32);

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TypeId {
    fn from(value: u32) -> Self {
        TypeId(value)
    }
}

impl From<u32> for PropId {
    fn from(value: u32) -> Self {
        PropId(value)
    }
}

/// Errors raised while importing or loading a graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The relationship source could not resolve a node (e.g. it was deleted mid-import).
    #[error("node {0} not found in relationship source")]
    NodeNotFound(u64),
    /// A weight property could not be converted to a floating point value.
    #[error("cannot convert property value '{value}' to a weight: {reason}")]
    PropertyConversion {
        /// Offending textual value.
        value: String,
        /// Parser failure description.
        reason: String,
    },
    /// A worker thread unwound instead of returning.
    #[error("import worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker slot.
        worker: usize,
    },
    /// Invalid configuration or argument.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Opaque failure reported by the relationship source.
    #[error("relationship source error: {0}")]
    Source(String),
    /// Configuration text could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    /// I/O failure while reading input files.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// CSV parsing failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
