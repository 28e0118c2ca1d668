//! # Alert Flow Controller
//!
//! Deduplicates alerts by fingerprint in a bounded cache and emits the whole
//! cache, newest first, once pushes have been quiet for the debounce interval.
//! Every push restarts the quiet period.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::debug;

use super::bus::PublishBus;
use super::driver::deliver;
use super::stats::StatisticsCollector;
use crate::config::AlertFlowConfig;
use crate::constants::TelemetryClass;
use crate::error::FlowResult;
use crate::models::{Alert, Fingerprint};

#[derive(Debug)]
pub struct AlertFlowController {
    debounce_interval: Duration,
    cache_max_size: usize,
    cache: Mutex<HashMap<Fingerprint, Alert>>,
    pushed: Notify,
    /// Accepted pushes, bumped under the cache lock
    push_seq: AtomicU64,
    /// `push_seq` as of the last list handed to the bus
    fired_seq: AtomicU64,
    stats: Arc<StatisticsCollector>,
}

impl AlertFlowController {
    pub fn new(config: &AlertFlowConfig, stats: Arc<StatisticsCollector>) -> Self {
        Self {
            debounce_interval: config.debounce_interval(),
            cache_max_size: config.cache_max_size.max(1),
            cache: Mutex::new(HashMap::new()),
            pushed: Notify::new(),
            push_seq: AtomicU64::new(0),
            fired_seq: AtomicU64::new(0),
            stats,
        }
    }

    /// Insert or replace by fingerprint, evicting the oldest alert on overflow,
    /// then restart the quiet period
    pub fn accept(&self, alert: Alert) {
        let fingerprint = alert.fingerprint();
        {
            let mut cache = self.cache.lock();
            if !cache.contains_key(&fingerprint) && cache.len() >= self.cache_max_size {
                if let Some(oldest) = cache
                    .iter()
                    .min_by_key(|(_, cached)| cached.timestamp)
                    .map(|(key, _)| *key)
                {
                    if let Some(evicted) = cache.remove(&oldest) {
                        debug!(
                            alert_id = %evicted.id,
                            component = %evicted.component,
                            "Alert cache full - evicted oldest alert"
                        );
                    }
                }
            }
            cache.insert(fingerprint, alert);
            self.push_seq.fetch_add(1, Ordering::Release);
            self.stats
                .class(TelemetryClass::Alerts)
                .set_cached(cache.len());
        }
        self.pushed.notify_one();
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
        self.stats.class(TelemetryClass::Alerts).set_cached(0);
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cache contents, newest first
    pub fn snapshot(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self.cache.lock().values().cloned().collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        alerts
    }

    fn fire(&self) -> FlowResult<Option<Vec<Alert>>> {
        let mut alerts: Vec<Alert> = {
            let cache = self.cache.lock();
            self.fired_seq
                .store(self.push_seq.load(Ordering::Acquire), Ordering::Release);
            cache.values().cloned().collect()
        };
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        if alerts.is_empty() {
            return Ok(None);
        }
        debug!(alerts = alerts.len(), "Debounce elapsed - emitting alert list");
        Ok(Some(alerts))
    }

    /// True when every accepted push is already part of a fired list
    fn caught_up(&self) -> bool {
        self.push_seq.load(Ordering::Acquire) == self.fired_seq.load(Ordering::Acquire)
    }
}

/// Trailing-edge debounce loop for the alert class
pub(crate) async fn run_debouncer(
    controller: Arc<AlertFlowController>,
    bus: Arc<PublishBus<Vec<Alert>>>,
    stats: Arc<StatisticsCollector>,
    mut shutdown: watch::Receiver<bool>,
) {
    let class = TelemetryClass::Alerts;

    while !*shutdown.borrow() {
        tokio::select! {
            _ = controller.pushed.notified() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        // A wake-up left over from a push the last list already carried
        if controller.caught_up() {
            debug!("Alert pushes already emitted - skipping debounce");
            continue;
        }

        // Quiet period: any further push restarts the wait
        loop {
            tokio::select! {
                biased;
                _ = controller.pushed.notified() => {}
                _ = tokio::time::sleep(controller.debounce_interval) => {
                    deliver(class, controller.fire(), &bus, &stats);
                    break;
                }
                _ = shutdown.changed() => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertLevel;
    use chrono::{Duration as ChronoDuration, Utc};

    fn controller(max: usize) -> AlertFlowController {
        let config = AlertFlowConfig {
            cache_max_size: max,
            ..AlertFlowConfig::default()
        };
        AlertFlowController::new(&config, Arc::new(StatisticsCollector::new()))
    }

    fn alert(component: &str, message: &str, offset_secs: i64) -> Alert {
        Alert::new(AlertLevel::Warning, component, message)
            .with_timestamp(Utc::now() + ChronoDuration::seconds(offset_secs))
    }

    #[test]
    fn test_duplicate_replaces_in_place() {
        let controller = controller(10);
        controller.accept(alert("db", "replica lag", 0));
        let newer = alert("db", "replica lag", 5);
        controller.accept(newer.clone());

        assert_eq!(controller.len(), 1);
        assert_eq!(controller.snapshot()[0], newer);
    }

    #[test]
    fn test_overflow_evicts_oldest_timestamp() {
        let controller = controller(3);
        controller.accept(alert("a", "one", 10));
        controller.accept(alert("b", "two", 0));
        controller.accept(alert("c", "three", 20));
        controller.accept(alert("d", "four", 30));

        let components: Vec<_> = controller
            .snapshot()
            .into_iter()
            .map(|a| a.component)
            .collect();
        assert_eq!(components, vec!["d", "c", "a"]);
    }

    #[test]
    fn test_duplicate_at_capacity_does_not_evict() {
        let controller = controller(2);
        controller.accept(alert("a", "one", 0));
        controller.accept(alert("b", "two", 1));
        controller.accept(alert("a", "one", 2));

        assert_eq!(controller.len(), 2);
        let components: Vec<_> = controller
            .snapshot()
            .into_iter()
            .map(|a| a.component)
            .collect();
        assert_eq!(components, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wakeup_for_already_emitted_push_is_ignored() {
        let controller = Arc::new(controller(5));
        let bus = Arc::new(PublishBus::new(TelemetryClass::Alerts, 8));
        let stats = Arc::new(StatisticsCollector::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sub = bus.subscribe();

        // The push lands just before the list is built, leaving a stored wake-up
        controller.accept(alert("db", "replica lag", 0));
        assert!(controller.fire().unwrap().is_some());

        let task = tokio::spawn(run_debouncer(
            controller.clone(),
            bus.clone(),
            stats.clone(),
            shutdown_rx,
        ));
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(sub.try_recv().is_none());

        // A genuinely new push still goes out
        controller.accept(alert("api", "throttled", 1));
        let list = sub.recv().await.unwrap();
        assert_eq!(list.len(), 2);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[test]
    fn test_fire_on_empty_cache_emits_nothing() {
        let controller = controller(5);
        assert!(controller.fire().unwrap().is_none());
    }
}
