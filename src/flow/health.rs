//! # Health Flow Controller
//!
//! Throttles health snapshots to one emission per tick. Snapshots are cached by
//! fingerprint; each tick picks the most recently updated snapshot pushed since
//! the previous tick and emits it unless it is semantically identical to the
//! last emission and that emission is still younger than the staleness ceiling.
//! After each tick only the entry for the last emitted state stays cached.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::driver::TickController;
use super::stats::StatisticsCollector;
use crate::config::HealthFlowConfig;
use crate::constants::TelemetryClass;
use crate::error::FlowResult;
use crate::models::{Fingerprint, HealthSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    /// Pushed since the last tick
    Pending,
    /// Already considered by a tick
    Emitted,
}

#[derive(Debug)]
struct HealthEntry {
    snapshot: HealthSnapshot,
    state: EntryState,
}

#[derive(Debug, Clone, Copy)]
struct LastEmission {
    fingerprint: Fingerprint,
    at: Instant,
}

#[derive(Debug, Default)]
struct HealthState {
    entries: HashMap<Fingerprint, HealthEntry>,
    last_emission: Option<LastEmission>,
}

#[derive(Debug)]
pub struct HealthFlowController {
    throttle_interval: Duration,
    staleness_ceiling: Duration,
    state: Mutex<HealthState>,
    stats: Arc<StatisticsCollector>,
}

impl HealthFlowController {
    pub fn new(config: &HealthFlowConfig, stats: Arc<StatisticsCollector>) -> Self {
        Self {
            throttle_interval: config.throttle_interval(),
            staleness_ceiling: config.staleness_ceiling(),
            state: Mutex::new(HealthState::default()),
            stats,
        }
    }

    /// Cache a validated snapshot, replacing any entry with the same fingerprint
    pub fn accept(&self, snapshot: HealthSnapshot) {
        let fingerprint = snapshot.fingerprint();
        let mut state = self.state.lock();
        state.entries.insert(
            fingerprint,
            HealthEntry {
                snapshot,
                state: EntryState::Pending,
            },
        );
        self.stats
            .class(TelemetryClass::Health)
            .set_cached(state.entries.len());
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        self.stats.class(TelemetryClass::Health).set_cached(0);
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select_emission(&self, now: Instant) -> Option<HealthSnapshot> {
        let mut state = self.state.lock();

        let candidate = state
            .entries
            .values()
            .filter(|entry| entry.state == EntryState::Pending)
            .max_by_key(|entry| entry.snapshot.last_updated)
            .map(|entry| entry.snapshot.clone())?;

        for entry in state.entries.values_mut() {
            entry.state = EntryState::Emitted;
        }

        let fingerprint = candidate.fingerprint();
        let suppressed = state.last_emission.is_some_and(|last| {
            let age = now.saturating_duration_since(last.at);
            if last.fingerprint == fingerprint && age < self.staleness_ceiling {
                debug!(
                    fingerprint = %fingerprint,
                    age_ms = age.as_millis() as u64,
                    "Suppressed unchanged health snapshot"
                );
                true
            } else {
                false
            }
        });

        if !suppressed {
            state.last_emission = Some(LastEmission {
                fingerprint,
                at: now,
            });
        }

        // Suppression only consults the last emitted state
        let retained = state.last_emission.map(|last| last.fingerprint);
        state.entries.retain(|key, _| Some(*key) == retained);
        self.stats
            .class(TelemetryClass::Health)
            .set_cached(state.entries.len());

        (!suppressed).then_some(candidate)
    }
}

impl TickController for HealthFlowController {
    type Output = HealthSnapshot;

    fn class(&self) -> TelemetryClass {
        TelemetryClass::Health
    }

    fn period(&self) -> Duration {
        self.throttle_interval
    }

    fn on_tick(&self) -> FlowResult<Option<HealthSnapshot>> {
        Ok(self.select_emission(Instant::now()))
    }
}
