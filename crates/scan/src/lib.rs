//! Scanning: incremental bulk scans, per-region scans, aggregate counts and flood fill.
//!
//! # Invariants
//! - Scans only read the world, through snapshots taken at dispatch time.
//! - Per-region counts are merged into a bulk scan's storage on the scheduling
//!   thread only.
//! - At most one bulk scan per `ScannerId` at a time.

pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod flood;
pub mod registry;
pub mod scheduler;
pub mod snapshot;
pub mod storage;
pub mod world_access;

pub use classify::{Classifier, RawSample};
pub use config::ScanConfig;
pub use error::{ConfigError, ScanError};
pub use executor::{
    ChunkExecutor, InlineExecutor, RegionExecutor, RegionResult, RegionScan, scan_snapshot,
};
pub use flood::{FloodFill, FloodFillOutcome, FloodFillRequest, submit_flood_fill};
pub use registry::{ScannerGuard, ScannerRegistry};
pub use scheduler::{ScanOutcome, ScanPhase, ScanProgress, ScanScheduler};
pub use snapshot::{SnapshotGrid, sample_at};
pub use storage::AggregateStorage;
pub use world_access::{LiveWorld, RegionHandle, WorldAccess};

pub fn crate_info() -> &'static str {
    "blockcensus-scan v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scan"));
    }
}
