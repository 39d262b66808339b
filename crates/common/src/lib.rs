//! Shared value types for blockcensus.
//!
//! # Invariants
//! - Every type here is an immutable value once constructed.
//! - `ScanObject` ordering is kind first, then name.

mod chunk;
mod options;
mod types;

pub use chunk::{CHUNK_SIZE, ChunkCuboid, ChunkLocation, ChunkPart};
pub use options::ScanOptions;
pub use types::{EntityId, ScanObject, ScanObjectKind, ScannerId, WorldId};
