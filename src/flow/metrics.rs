//! # Metrics Flow Controller
//!
//! Buffers samples (bounded, oldest dropped first) and, at each window close,
//! reduces the buffered samples to their per-gauge mean.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::driver::TickController;
use super::stats::StatisticsCollector;
use crate::config::MetricsFlowConfig;
use crate::constants::TelemetryClass;
use crate::error::{FlowError, FlowResult};
use crate::models::MetricsSample;

#[derive(Debug)]
pub struct MetricsFlowController {
    window_interval: Duration,
    buffer_max_size: usize,
    buffer: Mutex<VecDeque<MetricsSample>>,
    stats: Arc<StatisticsCollector>,
}

impl MetricsFlowController {
    pub fn new(config: &MetricsFlowConfig, stats: Arc<StatisticsCollector>) -> Self {
        Self {
            window_interval: config.window_interval(),
            buffer_max_size: config.buffer_max_size.max(1),
            buffer: Mutex::new(VecDeque::with_capacity(config.buffer_max_size)),
            stats,
        }
    }

    pub fn accept(&self, sample: MetricsSample) {
        let mut buffer = self.buffer.lock();
        while buffer.len() >= self.buffer_max_size {
            buffer.pop_front();
            debug!(
                buffer_max_size = self.buffer_max_size,
                "Metrics buffer full - dropped oldest sample"
            );
        }
        buffer.push_back(sample);
        self.stats
            .class(TelemetryClass::Metrics)
            .set_cached(buffer.len());
    }

    pub fn clear(&self) {
        let mut buffer = self.buffer.lock();
        buffer.clear();
        self.stats.class(TelemetryClass::Metrics).set_cached(0);
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the buffer, leaving it empty for the next window
    fn close_window(&self) -> Vec<MetricsSample> {
        let mut buffer = self.buffer.lock();
        let window: Vec<MetricsSample> = buffer.drain(..).collect();
        self.stats.class(TelemetryClass::Metrics).set_cached(0);
        window
    }
}

impl TickController for MetricsFlowController {
    type Output = MetricsSample;

    fn class(&self) -> TelemetryClass {
        TelemetryClass::Metrics
    }

    fn period(&self) -> Duration {
        self.window_interval
    }

    fn on_tick(&self) -> FlowResult<Option<MetricsSample>> {
        let window = self.close_window();
        let Some(averaged) = MetricsSample::average(&window) else {
            return Ok(None);
        };

        if let Some(gauge) = averaged.first_non_finite() {
            return Err(FlowError::transform_fault(
                TelemetryClass::Metrics,
                format!(
                    "mean of {gauge} over {} samples is not finite",
                    window.len()
                ),
            ));
        }

        debug!(samples = window.len(), "Closed metrics window");
        Ok(Some(averaged))
    }
}
