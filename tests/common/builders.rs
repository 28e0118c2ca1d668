//! Payload builders shared by the integration tests

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use telemetry_flow::config::FlowConfig;
use telemetry_flow::models::{
    Alert, AlertLevel, ComponentStatus, HealthSnapshot, HealthStatus, MetricsSample,
};

/// Fixed reference instant so timestamps compare deterministically
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn at_ms(offset_ms: i64) -> DateTime<Utc> {
    base_time() + ChronoDuration::milliseconds(offset_ms)
}

pub fn health_snapshot(database: HealthStatus, offset_ms: i64) -> HealthSnapshot {
    HealthSnapshot::new(
        HealthStatus::Healthy,
        vec![
            ComponentStatus::new("database", database),
            ComponentStatus::new("graph_api", HealthStatus::Healthy),
        ],
    )
    .with_last_updated(at_ms(offset_ms))
}

pub fn metrics_sample(cpu: f64, offset_ms: i64) -> MetricsSample {
    let mut gauges = [1.0; 8];
    gauges[0] = cpu;
    MetricsSample::from_gauges(gauges, at_ms(offset_ms))
}

pub fn alert(component: &str, message: &str, offset_ms: i64) -> Alert {
    Alert::new(AlertLevel::Warning, component, message).with_timestamp(at_ms(offset_ms))
}

/// Defaults, which are 2s throttle, 1s window and 5s debounce
pub fn default_config() -> FlowConfig {
    FlowConfig::default()
}
