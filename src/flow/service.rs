//! # Telemetry Flow Service
//!
//! Public front-end of the flow-control layer. Producers push health snapshots,
//! metrics samples and alerts from any thread; consumers subscribe to the
//! optimized per-class streams; operators read statistics and clear caches.
//!
//! ```rust,no_run
//! use telemetry_flow::config::FlowConfig;
//! use telemetry_flow::models::{Alert, AlertLevel};
//! use telemetry_flow::TelemetryFlowService;
//!
//! # async fn example() -> telemetry_flow::FlowResult<()> {
//! let service = TelemetryFlowService::start(FlowConfig::default())?;
//! let mut alerts = service.subscribe_alerts();
//!
//! service.push_alert(Alert::new(AlertLevel::Critical, "database", "connection pool exhausted"));
//!
//! if let Some(list) = alerts.recv().await {
//!     println!("{} active alerts", list.len());
//! }
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::alerts::{run_debouncer, AlertFlowController};
use super::bus::{PublishBus, Subscription};
use super::driver::{run_ticker, spawn_supervised};
use super::health::HealthFlowController;
use super::metrics::MetricsFlowController;
use super::stats::{FlowStatistics, StatisticsCollector};
use crate::config::FlowConfig;
use crate::constants::TelemetryClass;
use crate::error::{FlowError, FlowResult};
use crate::logging::log_rejected_push;
use crate::models::{Alert, HealthSnapshot, MetricsSample};

pub struct TelemetryFlowService {
    service_id: Uuid,
    config: FlowConfig,
    stats: Arc<StatisticsCollector>,
    health: Arc<HealthFlowController>,
    metrics: Arc<MetricsFlowController>,
    alerts: Arc<AlertFlowController>,
    health_bus: Arc<PublishBus<HealthSnapshot>>,
    metrics_bus: Arc<PublishBus<MetricsSample>>,
    alert_bus: Arc<PublishBus<Vec<Alert>>>,
    accepting: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for TelemetryFlowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryFlowService")
            .field("service_id", &self.service_id)
            .field("config", &self.config)
            .field("accepting", &self.accepting.load(Ordering::Relaxed))
            .finish()
    }
}

impl TelemetryFlowService {
    /// Validate `config` and spawn one supervised emission task per class.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: FlowConfig) -> FlowResult<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current()
            .map_err(|e| FlowError::Runtime(format!("no tokio runtime available: {e}")))?;

        let service_id = Uuid::new_v4();
        let stats = Arc::new(StatisticsCollector::new());
        let capacity = config.bus.channel_capacity;

        let health = Arc::new(HealthFlowController::new(&config.health, stats.clone()));
        let metrics = Arc::new(MetricsFlowController::new(&config.metrics, stats.clone()));
        let alerts = Arc::new(AlertFlowController::new(&config.alerts, stats.clone()));

        let health_bus = Arc::new(PublishBus::new(TelemetryClass::Health, capacity));
        let metrics_bus = Arc::new(PublishBus::new(TelemetryClass::Metrics, capacity));
        let alert_bus = Arc::new(PublishBus::new(TelemetryClass::Alerts, capacity));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let health_task = {
            let (controller, bus, stats) = (health.clone(), health_bus.clone(), stats.clone());
            spawn_supervised(
                TelemetryClass::Health,
                stats.clone(),
                shutdown_rx.clone(),
                move |rx| run_ticker(controller.clone(), bus.clone(), stats.clone(), rx),
            )
        };
        let metrics_task = {
            let (controller, bus, stats) = (metrics.clone(), metrics_bus.clone(), stats.clone());
            spawn_supervised(
                TelemetryClass::Metrics,
                stats.clone(),
                shutdown_rx.clone(),
                move |rx| run_ticker(controller.clone(), bus.clone(), stats.clone(), rx),
            )
        };
        let alert_task = {
            let (controller, bus, stats) = (alerts.clone(), alert_bus.clone(), stats.clone());
            spawn_supervised(
                TelemetryClass::Alerts,
                stats.clone(),
                shutdown_rx,
                move |rx| run_debouncer(controller.clone(), bus.clone(), stats.clone(), rx),
            )
        };

        info!(
            service_id = %service_id,
            health_throttle_ms = config.health.throttle_interval_ms,
            health_staleness_ms = config.health.staleness_ceiling_ms,
            metrics_window_ms = config.metrics.window_interval_ms,
            metrics_buffer_max = config.metrics.buffer_max_size,
            alert_debounce_ms = config.alerts.debounce_interval_ms,
            alerts_cache_max = config.alerts.cache_max_size,
            "Telemetry flow service started"
        );

        Ok(Self {
            service_id,
            config,
            stats,
            health,
            metrics,
            alerts,
            health_bus,
            metrics_bus,
            alert_bus,
            accepting: AtomicBool::new(true),
            shutdown_tx,
            tasks: Mutex::new(vec![health_task, metrics_task, alert_task]),
        })
    }

    pub fn service_id(&self) -> Uuid {
        self.service_id
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn push_health(&self, snapshot: HealthSnapshot) {
        if self.admit(TelemetryClass::Health, snapshot.validate()) {
            self.health.accept(snapshot);
        }
    }

    pub fn push_metrics(&self, sample: MetricsSample) {
        if self.admit(TelemetryClass::Metrics, sample.validate()) {
            self.metrics.accept(sample);
        }
    }

    pub fn push_alert(&self, alert: Alert) {
        if self.admit(TelemetryClass::Alerts, alert.validate()) {
            self.alerts.accept(alert);
        }
    }

    /// Throttled health stream
    pub fn subscribe_health(&self) -> Subscription<HealthSnapshot> {
        self.health_bus.subscribe()
    }

    /// Windowed, averaged metrics stream
    pub fn subscribe_metrics(&self) -> Subscription<MetricsSample> {
        self.metrics_bus.subscribe()
    }

    /// Debounced alert list stream, newest first
    pub fn subscribe_alerts(&self) -> Subscription<Vec<Alert>> {
        self.alert_bus.subscribe()
    }

    pub fn subscriber_count(&self, class: TelemetryClass) -> usize {
        match class {
            TelemetryClass::Health => self.health_bus.subscriber_count(),
            TelemetryClass::Metrics => self.metrics_bus.subscriber_count(),
            TelemetryClass::Alerts => self.alert_bus.subscriber_count(),
        }
    }

    pub fn statistics(&self) -> FlowStatistics {
        self.stats.snapshot()
    }

    /// Empty every cache and buffer; counters are left untouched.
    ///
    /// Each class is cleared under its own lock, one after another.
    pub fn clear_cache(&self) {
        self.health.clear();
        self.metrics.clear();
        self.alerts.clear();
        info!(service_id = %self.service_id, "Telemetry caches cleared");
    }

    pub fn is_running(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Stop the emission tasks and close every subscription
    pub async fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::AcqRel) {
            return;
        }
        info!(service_id = %self.service_id, "Stopping telemetry flow service");

        let _ = self.shutdown_tx.send(true);
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(service_id = %self.service_id, error = %e, "Emission task ended abnormally");
            }
        }

        self.health_bus.close();
        self.metrics_bus.close();
        self.alert_bus.close();

        info!(service_id = %self.service_id, "Telemetry flow service stopped");
    }

    /// Count and forward valid pushes; log and drop everything else
    fn admit(&self, class: TelemetryClass, validation: FlowResult<()>) -> bool {
        if !self.accepting.load(Ordering::Acquire) {
            debug!(class = %class, "Push after shutdown dropped");
            return false;
        }
        let counters = self.stats.class(class);
        match validation {
            Ok(()) => {
                counters.record_push();
                true
            }
            Err(e) => {
                counters.record_rejected();
                log_rejected_push(class, &e.to_string());
                false
            }
        }
    }
}

impl Drop for TelemetryFlowService {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
