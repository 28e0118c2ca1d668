use proptest::prelude::*;
use telemetry_flow::models::{AlertLevel, HealthStatus};

pub fn component_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

pub fn health_status_strategy() -> impl Strategy<Value = HealthStatus> {
    prop_oneof![
        Just(HealthStatus::Healthy),
        Just(HealthStatus::Warning),
        Just(HealthStatus::Critical),
        Just(HealthStatus::Unknown),
    ]
}

pub fn alert_level_strategy() -> impl Strategy<Value = AlertLevel> {
    prop_oneof![
        Just(AlertLevel::Info),
        Just(AlertLevel::Warning),
        Just(AlertLevel::Critical),
    ]
}

/// Finite gauge readings in a range that cannot overflow when summed
pub fn gauge_strategy() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6
}

pub fn gauges_strategy() -> impl Strategy<Value = [f64; 8]> {
    prop::array::uniform8(gauge_strategy())
}

/// (component, message, offset_ms) triples with a small key space so duplicates occur
pub fn alert_spec_strategy() -> impl Strategy<Value = Vec<(String, String, i64)>> {
    prop::collection::vec(
        ("[a-d]", "(disk|cpu|queue) (high|low)", 0i64..100_000),
        0..60,
    )
}
