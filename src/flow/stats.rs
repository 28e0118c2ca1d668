//! # Flow Statistics
//!
//! Lock-free per-class counters. Producers and emission tasks bump atomics that
//! are independent of the cache locks, so [`StatisticsCollector::snapshot`]
//! never waits on a producer or a controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

use crate::constants::TelemetryClass;

/// Counters for one telemetry class
#[derive(Debug, Default)]
pub struct ClassCounters {
    /// Valid pushes accepted by the front-end
    pushed: AtomicU64,
    /// Events handed to the publish bus
    emitted: AtomicU64,
    /// Pushes dropped by validation
    rejected: AtomicU64,
    /// Emission steps that failed or panicked and were recovered
    transform_faults: AtomicU64,
    /// Current cache/buffer size, refreshed under the class lock
    cached: AtomicUsize,
}

impl ClassCounters {
    pub fn record_push(&self) {
        self.pushed.fetch_add(1, Ordering::Release);
    }

    pub fn record_emit(&self) {
        let count = self.emitted.fetch_add(1, Ordering::Release);

        if count > 0 && count % 10_000 == 0 {
            debug!(total_emitted = count, "Emission milestone");
        }
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transform_fault(&self) {
        self.transform_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_cached(&self, size: usize) {
        self.cached.store(size, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ClassStatistics {
        // emitted before pushed: every emit follows at least one push, so this
        // order keeps emitted <= pushed in the snapshot
        let emitted = self.emitted.load(Ordering::Acquire);
        let pushed = self.pushed.load(Ordering::Acquire);

        ClassStatistics {
            pushed,
            emitted,
            rejected: self.rejected.load(Ordering::Relaxed),
            transform_faults: self.transform_faults.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            compression_ratio: ratio(emitted, pushed),
        }
    }
}

/// Point-in-time view of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStatistics {
    pub pushed: u64,
    pub emitted: u64,
    pub rejected: u64,
    pub transform_faults: u64,
    pub cached: usize,
    /// emitted / pushed, 0 when nothing was pushed
    pub compression_ratio: f64,
}

/// Point-in-time view of the whole flow-control layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStatistics {
    pub health: ClassStatistics,
    pub metrics: ClassStatistics,
    pub alerts: ClassStatistics,
    pub overall_compression_ratio: f64,
    pub captured_at: DateTime<Utc>,
}

impl FlowStatistics {
    pub fn class(&self, class: TelemetryClass) -> &ClassStatistics {
        match class {
            TelemetryClass::Health => &self.health,
            TelemetryClass::Metrics => &self.metrics,
            TelemetryClass::Alerts => &self.alerts,
        }
    }

    pub fn total_cached(&self) -> usize {
        self.health.cached + self.metrics.cached + self.alerts.cached
    }
}

/// Shared by the front-end and every emission task
#[derive(Debug, Default)]
pub struct StatisticsCollector {
    health: ClassCounters,
    metrics: ClassCounters,
    alerts: ClassCounters,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(&self, class: TelemetryClass) -> &ClassCounters {
        match class {
            TelemetryClass::Health => &self.health,
            TelemetryClass::Metrics => &self.metrics,
            TelemetryClass::Alerts => &self.alerts,
        }
    }

    pub fn snapshot(&self) -> FlowStatistics {
        let health = self.health.snapshot();
        let metrics = self.metrics.snapshot();
        let alerts = self.alerts.snapshot();

        let emitted = health.emitted + metrics.emitted + alerts.emitted;
        let pushed = health.pushed + metrics.pushed + alerts.pushed;

        FlowStatistics {
            overall_compression_ratio: ratio(emitted, pushed),
            health,
            metrics,
            alerts,
            captured_at: Utc::now(),
        }
    }
}

fn ratio(emitted: u64, pushed: u64) -> f64 {
    if pushed == 0 {
        0.0
    } else {
        emitted as f64 / pushed as f64
    }
}
