use blockcensus_common::{ChunkLocation, ScanObject, ScannerId};

/// Errors from bulk scans and per-region scans.
///
/// Region-level variants only ever travel inside one region's result; the
/// scheduler logs them and skips the region.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan already in progress for {0}")]
    AlreadyScanning(ScannerId),
    #[error("failed to load region {location}: {reason}")]
    RegionLoadFailure {
        location: ChunkLocation,
        reason: String,
    },
    #[error("worker fault while scanning region {location}: {reason}")]
    WorkerFault {
        location: ChunkLocation,
        reason: String,
    },
    #[error("flood fill target {0} is not a block type")]
    NonBlockTarget(ScanObject),
}

/// Errors from loading scan configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
