use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tuning knobs for the synchronization core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Milliseconds between topology refresh ticks.
    pub refresh_interval_ms: u64,
    /// Every Nth tick carries statistics; the rest are stats-less.
    pub stat_request_period: u64,
    /// Auto-dismiss lifetime for success notifications, milliseconds.
    pub success_notice_ms: u64,
    /// Percent above which arena/quota usage counts toward fragmentation.
    pub fragmentation_high_pct: f64,
    /// Percent above which items usage alone raises a caution.
    pub fragmentation_medium_pct: f64,
    /// Bounded retries when re-reading cluster facts after a bootstrap.
    pub cluster_refetch_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 2500,
            stat_request_period: 10,
            success_notice_ms: 3000,
            fragmentation_high_pct: 90.0,
            fragmentation_medium_pct: 60.0,
            cluster_refetch_attempts: 5,
        }
    }
}

impl SyncConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => {
                let config: SyncConfig = toml::from_str(&contents)?;
                Ok(config)
            }
            "json" => {
                let config: SyncConfig = serde_json::from_str(&contents)?;
                Ok(config)
            }
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn success_notice_timeout(&self) -> Duration {
        Duration::from_millis(self.success_notice_ms)
    }
}
