//! Low-level primitives for building the import pipeline.
//!
//! Includes byte codecs, paged huge arrays with bump allocation, and the
//! node scheduling queue.

/// Byte-level utilities and encoding/decoding.
///
/// Varint and fixed-width integer codecs used by the adjacency records.
pub mod bytes;

/// Concurrency primitives and scheduling.
pub mod concurrency;

/// Paged arrays addressable by a 64-bit index.
pub mod huge;
