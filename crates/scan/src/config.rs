use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Scan throughput and reporting configuration.
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```yaml
/// chunks_per_iteration: 250
/// progress_interval_ms: 1000
/// max_scan_duration_ms: 600000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Upper bound on per-region scans in flight for one bulk scan.
    pub chunks_per_iteration: usize,
    /// Cadence at which the host is expected to call `ScanScheduler::tick`.
    pub tick_interval_ms: u64,
    /// Minimum time between two progress reports of a bulk scan.
    pub progress_interval_ms: u64,
    /// Force completion with partial results after this long.
    pub max_scan_duration_ms: Option<u64>,
    /// Minimum time between two flood-fill progress reports.
    pub flood_progress_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunks_per_iteration: 1000,
            tick_interval_ms: 50,
            progress_interval_ms: 500,
            max_scan_duration_ms: None,
            flood_progress_interval_ms: 10_000,
        }
    }
}

impl ScanConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunks_per_iteration == 0 {
            return Err(ConfigError::Invalid(
                "chunks_per_iteration must be at least 1".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.max_scan_duration_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "max_scan_duration_ms must be positive when set".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn max_scan_duration(&self) -> Option<Duration> {
        self.max_scan_duration_ms.map(Duration::from_millis)
    }

    pub fn flood_progress_interval(&self) -> Duration {
        Duration::from_millis(self.flood_progress_interval_ms)
    }
}
