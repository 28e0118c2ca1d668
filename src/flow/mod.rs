//! Flow-control core: one controller per telemetry class, the publish bus that
//! fans controller output out to subscribers, and the statistics collector that
//! observes both sides.

pub mod alerts;
pub mod bus;
pub(crate) mod driver;
pub mod health;
pub mod metrics;
pub mod service;
pub mod stats;

pub use alerts::AlertFlowController;
pub use bus::{PublishBus, Subscription};
pub use health::HealthFlowController;
pub use metrics::MetricsFlowController;
pub use service::TelemetryFlowService;
pub use stats::{ClassCounters, ClassStatistics, FlowStatistics, StatisticsCollector};
