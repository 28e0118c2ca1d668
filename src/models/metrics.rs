use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::TelemetryClass;
use crate::error::{FlowError, FlowResult};

/// One performance sample: eight gauges plus the time it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
    pub disk_usage_percent: f64,
    pub network_throughput: f64,
    pub active_connections: f64,
    pub requests_per_minute: f64,
    pub average_latency_ms: f64,
    pub error_rate_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricsSample {
    pub const GAUGE_NAMES: [&'static str; 8] = [
        "cpu_usage_percent",
        "memory_usage_percent",
        "disk_usage_percent",
        "network_throughput",
        "active_connections",
        "requests_per_minute",
        "average_latency_ms",
        "error_rate_percent",
    ];

    /// Sample with every gauge at zero, stamped now
    pub fn zeroed() -> Self {
        Self::from_gauges([0.0; 8], Utc::now())
    }

    pub fn from_gauges(gauges: [f64; 8], timestamp: DateTime<Utc>) -> Self {
        let [cpu, memory, disk, network, connections, rpm, latency, errors] = gauges;
        Self {
            cpu_usage_percent: cpu,
            memory_usage_percent: memory,
            disk_usage_percent: disk,
            network_throughput: network,
            active_connections: connections,
            requests_per_minute: rpm,
            average_latency_ms: latency,
            error_rate_percent: errors,
            timestamp,
        }
    }

    /// Gauges in [`Self::GAUGE_NAMES`] order
    pub fn gauges(&self) -> [f64; 8] {
        [
            self.cpu_usage_percent,
            self.memory_usage_percent,
            self.disk_usage_percent,
            self.network_throughput,
            self.active_connections,
            self.requests_per_minute,
            self.average_latency_ms,
            self.error_rate_percent,
        ]
    }

    pub fn validate(&self) -> FlowResult<()> {
        match self.first_non_finite() {
            Some(name) => Err(FlowError::invalid_input(
                TelemetryClass::Metrics,
                format!("gauge {name} is not a finite number"),
            )),
            None => Ok(()),
        }
    }

    /// Reduce a window to one synthetic sample.
    ///
    /// Each gauge is the arithmetic mean across `samples`; the timestamp is the
    /// latest sample timestamp so the result anchors to the most recent reading.
    /// Returns `None` for an empty window.
    ///
    /// The mean is accumulated incrementally, so finite gauges of the same sign
    /// never overflow. Only readings spanning nearly the whole `f64` range with
    /// opposite signs can produce a non-finite result.
    pub fn average(samples: &[MetricsSample]) -> Option<MetricsSample> {
        let latest = samples.iter().map(|s| s.timestamp).max()?;

        let mut means = [0.0_f64; 8];
        for (k, sample) in samples.iter().enumerate() {
            let weight = (k + 1) as f64;
            for (mean, gauge) in means.iter_mut().zip(sample.gauges()) {
                *mean += (gauge - *mean) / weight;
            }
        }

        Some(Self::from_gauges(means, latest))
    }

    pub(crate) fn first_non_finite(&self) -> Option<&'static str> {
        Self::GAUGE_NAMES
            .iter()
            .zip(self.gauges())
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| *name)
    }
}
