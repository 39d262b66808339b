//! World kernel: the live voxel world that scans read from.
//!
//! # Invariants
//! - All state mutations flow through explicit `World` operations and are logged.
//! - A `RegionSnapshot` never changes after capture, whatever happens to the world.

pub mod blocks;
pub mod region;
pub mod world;

pub use blocks::{BlockId, BlockRegistry};
pub use region::{EntityCategory, EntityRecord, Region, RegionSnapshot};
pub use world::{SharedWorld, World, WorldError, WorldEvent};
