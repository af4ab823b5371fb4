//! Capacity projections over per-instance statistics.
//!
//! Ratio fields arrive as percent strings (`"91.2%"`); everything here
//! parses them leniently and degrades to "no signal" rather than erroring
//! on a malformed row.

use clusterdeck_api::topology::InstanceStats;

use crate::config::SyncConfig;

/// Parses a percent string like `"91.2%"`. Garbage yields `None`.
pub fn parse_ratio(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse::<f64>().ok()
}

/// Memory fragmentation assessment for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentationLevel {
    High,
    Medium,
    Low,
}

impl FragmentationLevel {
    /// High needs arena, quota and items all above the cutoff; arena and
    /// quota alone make it medium; anything else is low.
    pub fn of(stats: &InstanceStats, config: &SyncConfig) -> Self {
        let cutoff = config.fragmentation_high_pct;
        let arena = parse_ratio(&stats.arena_used_ratio).unwrap_or(0.0);
        let quota = parse_ratio(&stats.quota_used_ratio).unwrap_or(0.0);
        let items = parse_ratio(&stats.items_used_ratio).unwrap_or(0.0);

        if arena > cutoff && quota > cutoff && items > cutoff {
            FragmentationLevel::High
        } else if arena > cutoff && quota > cutoff {
            FragmentationLevel::Medium
        } else {
            FragmentationLevel::Low
        }
    }
}

/// Coloring bucket for a single usage gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageIntent {
    Good,
    Warning,
    Danger,
}

impl UsageIntent {
    pub fn classify(percent: f64, config: &SyncConfig) -> Self {
        if percent > config.fragmentation_high_pct {
            UsageIntent::Danger
        } else if percent > config.fragmentation_medium_pct {
            UsageIntent::Warning
        } else {
            UsageIntent::Good
        }
    }
}

/// Arena usage as a fraction of the memory quota, in percent.
pub fn quota_used_percent(stats: &InstanceStats) -> Option<f64> {
    parse_ratio(&stats.quota_used_ratio)
}
