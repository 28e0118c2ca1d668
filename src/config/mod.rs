//! # Flow Control Configuration
//!
//! Cadences and capacities for each telemetry class. Every section has defaults
//! matching the documented behaviour, so an empty configuration source yields a
//! working service.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use telemetry_flow::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let throttle = manager.config().health.throttle_interval();
//! # Ok(())
//! # }
//! ```
//!
//! Durations are expressed in milliseconds in every source (files and
//! environment variables) and exposed as [`std::time::Duration`] accessors.

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration for the flow-control layer
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Health snapshot throttling
    pub health: HealthFlowConfig,
    /// Metrics windowing
    pub metrics: MetricsFlowConfig,
    /// Alert debouncing and deduplication
    pub alerts: AlertFlowConfig,
    /// Publish bus sizing
    pub bus: BusConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthFlowConfig {
    pub throttle_interval_ms: u64,
    /// Heuristic: an unchanged snapshot is re-emitted once the previous emission
    /// is at least this old
    pub staleness_ceiling_ms: u64,
}

impl Default for HealthFlowConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: defaults::HEALTH_THROTTLE_INTERVAL_MS,
            staleness_ceiling_ms: defaults::HEALTH_STALENESS_CEILING_MS,
        }
    }
}

impl HealthFlowConfig {
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    pub fn staleness_ceiling(&self) -> Duration {
        Duration::from_millis(self.staleness_ceiling_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsFlowConfig {
    pub window_interval_ms: u64,
    pub buffer_max_size: usize,
}

impl Default for MetricsFlowConfig {
    fn default() -> Self {
        Self {
            window_interval_ms: defaults::METRICS_WINDOW_INTERVAL_MS,
            buffer_max_size: defaults::METRICS_BUFFER_MAX_SIZE,
        }
    }
}

impl MetricsFlowConfig {
    pub fn window_interval(&self) -> Duration {
        Duration::from_millis(self.window_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertFlowConfig {
    pub debounce_interval_ms: u64,
    pub cache_max_size: usize,
}

impl Default for AlertFlowConfig {
    fn default() -> Self {
        Self {
            debounce_interval_ms: defaults::ALERT_DEBOUNCE_INTERVAL_MS,
            cache_max_size: defaults::ALERTS_CACHE_MAX_SIZE,
        }
    }
}

impl AlertFlowConfig {
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Events buffered per class before a lagging subscriber starts skipping
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::BUS_CHANNEL_CAPACITY,
        }
    }
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_health_throttle_interval(mut self, interval: Duration) -> Self {
        self.health.throttle_interval_ms = duration_ms(interval);
        self
    }

    pub fn with_health_staleness_ceiling(mut self, ceiling: Duration) -> Self {
        self.health.staleness_ceiling_ms = duration_ms(ceiling);
        self
    }

    pub fn with_metrics_window_interval(mut self, interval: Duration) -> Self {
        self.metrics.window_interval_ms = duration_ms(interval);
        self
    }

    pub fn with_metrics_buffer_max_size(mut self, size: usize) -> Self {
        self.metrics.buffer_max_size = size;
        self
    }

    pub fn with_alert_debounce_interval(mut self, interval: Duration) -> Self {
        self.alerts.debounce_interval_ms = duration_ms(interval);
        self
    }

    pub fn with_alerts_cache_max_size(mut self, size: usize) -> Self {
        self.alerts.cache_max_size = size;
        self
    }

    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus.channel_capacity = capacity;
        self
    }

    /// Reject settings that would stall a ticker or make a cache unusable
    pub fn validate(&self) -> ConfigResult<()> {
        let intervals = [
            ("health.throttle_interval_ms", self.health.throttle_interval_ms),
            ("health.staleness_ceiling_ms", self.health.staleness_ceiling_ms),
            ("metrics.window_interval_ms", self.metrics.window_interval_ms),
            ("alerts.debounce_interval_ms", self.alerts.debounce_interval_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value,
                    "interval must be greater than 0",
                ));
            }
        }

        let capacities = [
            ("metrics.buffer_max_size", self.metrics.buffer_max_size),
            ("alerts.cache_max_size", self.alerts.cache_max_size),
            ("bus.channel_capacity", self.bus.channel_capacity),
        ];
        for (field, value) in capacities {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value,
                    "capacity must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = FlowConfig::default();
        assert_eq!(config.health.throttle_interval(), Duration::from_secs(2));
        assert_eq!(config.health.staleness_ceiling(), Duration::from_secs(30));
        assert_eq!(config.metrics.window_interval(), Duration::from_secs(1));
        assert_eq!(config.alerts.debounce_interval(), Duration::from_secs(5));
        assert_eq!(config.metrics.buffer_max_size, 10);
        assert_eq!(config.alerts.cache_max_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = FlowConfig::new()
            .with_health_throttle_interval(Duration::from_millis(250))
            .with_alerts_cache_max_size(3);
        assert_eq!(config.health.throttle_interval_ms, 250);
        assert_eq!(config.alerts.cache_max_size, 3);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = FlowConfig::new().with_metrics_window_interval(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("metrics.window_interval_ms"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = FlowConfig::new().with_alerts_cache_max_size(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alerts.cache_max_size"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: FlowConfig =
            serde_json::from_str(r#"{"alerts": {"cache_max_size": 5}}"#).unwrap();
        assert_eq!(config.alerts.cache_max_size, 5);
        assert_eq!(
            config.alerts.debounce_interval_ms,
            defaults::ALERT_DEBOUNCE_INTERVAL_MS
        );
        assert_eq!(config.health, HealthFlowConfig::default());
    }
}
