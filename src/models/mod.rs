//! Telemetry payloads accepted by the ingestion front-end and delivered to
//! subscribers. All payloads are immutable values: a new push creates a new value.

pub mod alert;
pub mod fingerprint;
pub mod health;
pub mod metrics;

pub use alert::{Alert, AlertLevel};
pub use fingerprint::Fingerprint;
pub use health::{ComponentStatus, HealthSnapshot, HealthStatus};
pub use metrics::MetricsSample;
