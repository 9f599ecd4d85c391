//! Compressed in-memory graph import.
//!
//! Reads relationships from a [`RelationshipSource`], maps node ids to a dense
//! compact range, and builds delta-encoded adjacency lists in paged 64-bit
//! indexed arrays using a pool of worker threads.
//!
//! ```no_run
//! use hugegraph::{Dir, GraphFactory, IdMap, ImportOptions, LoadDirection, MemorySource};
//! use hugegraph::types::TypeId;
//!
//! let mut builder = MemorySource::builder();
//! builder.add_relationship(1, 2, TypeId(0), Vec::new());
//! let source = builder.build();
//! let id_map = IdMap::from_original_ids(source.node_ids().iter().copied());
//! let options = ImportOptions::new().direction(LoadDirection::Undirected);
//! let graph = GraphFactory::new(&source, options).build(id_map)?;
//! assert_eq!(graph.degree(0, Dir::Both), 1);
//! # Ok::<(), hugegraph::GraphError>(())
//! ```

#![warn(missing_docs)]

pub mod graph;
pub mod import;
pub mod primitives;
pub mod source;
pub mod types;

pub use graph::{HugeGraph, IdMap, IdMapping};
pub use import::{GraphFactory, ImportOptions, LoadDirection};
pub use source::{Dir, MemorySource, RelationshipSource};
pub use types::{GraphError, Result};
