//! # Flow Control Constants
//!
//! Default cadences and capacities for the three telemetry classes, plus the
//! [`TelemetryClass`] tag used by statistics, logging and the publish bus.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default flow-control settings applied when no configuration overrides them
pub mod defaults {
    /// Health snapshots are emitted at most once per this interval
    pub const HEALTH_THROTTLE_INTERVAL_MS: u64 = 2_000;
    /// An unchanged health snapshot is re-emitted once the last emission is this old
    pub const HEALTH_STALENESS_CEILING_MS: u64 = 30_000;
    /// Metrics samples are averaged over non-overlapping windows of this length
    pub const METRICS_WINDOW_INTERVAL_MS: u64 = 1_000;
    /// Quiet period required after the last alert push before the cache is emitted
    pub const ALERT_DEBOUNCE_INTERVAL_MS: u64 = 5_000;
    /// Maximum number of samples buffered per metrics window
    pub const METRICS_BUFFER_MAX_SIZE: usize = 10;
    /// Maximum number of distinct alerts held in the dedup cache
    pub const ALERTS_CACHE_MAX_SIZE: usize = 50;
    /// Per-class broadcast capacity before slow subscribers start skipping events
    pub const BUS_CHANNEL_CAPACITY: usize = 64;
}

/// The three telemetry classes, each with an isolated flow-control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryClass {
    Health,
    Metrics,
    Alerts,
}

impl TelemetryClass {
    pub const ALL: [TelemetryClass; 3] = [Self::Health, Self::Metrics, Self::Alerts];

    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryClass::Health => "health",
            TelemetryClass::Metrics => "metrics",
            TelemetryClass::Alerts => "alerts",
        }
    }
}

impl fmt::Display for TelemetryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names_are_stable() {
        let names: Vec<_> = TelemetryClass::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["health", "metrics", "alerts"]);
    }

    #[test]
    fn test_class_serializes_snake_case() {
        let json = serde_json::to_string(&TelemetryClass::Alerts).unwrap();
        assert_eq!(json, "\"alerts\"");
    }
}
