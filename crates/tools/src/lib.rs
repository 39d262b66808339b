//! Developer tooling: scan reports, world inspector, formatting helpers.
//!
//! # Invariants
//! - Tools only read; nothing here mutates a world or a scan.

mod format;
mod inspector;
mod report;

pub use format::{pretty_count, pretty_duration};
pub use inspector::{RegionInfo, WorldInspector, WorldSummary};
pub use report::{ReportItem, ScanReport};

pub fn crate_info() -> &'static str {
    "blockcensus-tools v0.1.0"
}
