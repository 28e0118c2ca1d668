//! Emission task plumbing shared by the three controllers.
//!
//! Every class runs on its own supervised task. A step that returns an error is
//! logged and counted; a step that panics takes down only the worker task, which
//! the supervisor restarts against the same shared controller state.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::bus::PublishBus;
use super::stats::StatisticsCollector;
use crate::constants::TelemetryClass;
use crate::error::FlowResult;
use crate::logging::log_transform_fault;

/// A controller that reduces its cache to at most one event per fixed tick
pub(crate) trait TickController: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    fn class(&self) -> TelemetryClass;

    fn period(&self) -> Duration;

    /// Close the current tick, yielding the event to publish if any
    fn on_tick(&self) -> FlowResult<Option<Self::Output>>;
}

/// Hand a step outcome to the bus and record it
pub(crate) fn deliver<T: Clone + Send + 'static>(
    class: TelemetryClass,
    outcome: FlowResult<Option<T>>,
    bus: &PublishBus<T>,
    stats: &StatisticsCollector,
) {
    match outcome {
        Ok(Some(event)) => {
            stats.class(class).record_emit();
            let receivers = bus.publish(event);
            debug!(class = %class, receivers = receivers, "Emitted optimized update");
        }
        Ok(None) => {}
        Err(e) => {
            stats.class(class).record_transform_fault();
            log_transform_fault(class, "emit", &e.to_string());
        }
    }
}

/// Drive a [`TickController`] until shutdown is signalled
pub(crate) async fn run_ticker<C: TickController>(
    controller: Arc<C>,
    bus: Arc<PublishBus<C::Output>>,
    stats: Arc<StatisticsCollector>,
    mut shutdown: watch::Receiver<bool>,
) {
    let class = controller.class();
    let period = controller.period();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(class = %class, period_ms = period.as_millis() as u64, "Ticker started");

    while !*shutdown.borrow() {
        tokio::select! {
            _ = ticker.tick() => {
                deliver(class, controller.on_tick(), &bus, &stats);
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!(class = %class, "Ticker stopped");
}

/// Spawn `make_loop` and restart it whenever it panics.
///
/// The supervisor ends when the loop returns normally (shutdown) or is
/// cancelled.
pub(crate) fn spawn_supervised<F, Fut>(
    class: TelemetryClass,
    stats: Arc<StatisticsCollector>,
    shutdown: watch::Receiver<bool>,
    make_loop: F,
) -> JoinHandle<()>
where
    F: Fn(watch::Receiver<bool>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut restarts: u64 = 0;
        loop {
            let worker = tokio::spawn(make_loop(shutdown.clone()));
            match worker.await {
                Ok(()) => break,
                Err(e) if e.is_panic() => {
                    restarts += 1;
                    stats.class(class).record_transform_fault();
                    log_transform_fault(class, "emission_loop", &panic_message(e.into_panic()));
                    if *shutdown.borrow() {
                        break;
                    }
                    info!(class = %class, restarts = restarts, "Restarting emission loop");
                }
                Err(e) => {
                    warn!(class = %class, error = %e, "Emission loop cancelled");
                    break;
                }
            }
        }
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
