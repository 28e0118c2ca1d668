use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::Fingerprint;
use crate::constants::TelemetryClass;
use crate::error::{FlowError, FlowResult};

/// Health status shared by the overall snapshot and individual components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "healthy" => Ok(HealthStatus::Healthy),
            "warning" => Ok(HealthStatus::Warning),
            "critical" => Ok(HealthStatus::Critical),
            "unknown" => Ok(HealthStatus::Unknown),
            other => Err(FlowError::invalid_input(
                TelemetryClass::Health,
                format!("unknown health status '{other}'"),
            )),
        }
    }
}

/// Health of one monitored component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub name: String,
    pub status: HealthStatus,
    pub description: String,
    #[serde(with = "crate::utils::serde::duration_ms")]
    pub response_time: Duration,
}

impl ComponentStatus {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            description: String::new(),
            response_time: Duration::ZERO,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response_time = response_time;
        self
    }
}

/// Point-in-time health of the whole system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub overall_status: HealthStatus,
    pub components: Vec<ComponentStatus>,
    pub last_updated: DateTime<Utc>,
}

impl HealthSnapshot {
    pub fn new(overall_status: HealthStatus, components: Vec<ComponentStatus>) -> Self {
        Self {
            overall_status,
            components,
            last_updated: Utc::now(),
        }
    }

    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = last_updated;
        self
    }

    /// Key over the overall status and the name-sorted component statuses.
    ///
    /// Descriptions, response times and timestamps do not take part, so two
    /// snapshots share a fingerprint exactly when they are semantically unchanged.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut statuses: Vec<(&str, HealthStatus)> = self
            .components
            .iter()
            .map(|c| (c.name.as_str(), c.status))
            .collect();
        statuses.sort_unstable();
        Fingerprint::of(&(self.overall_status, statuses))
    }

    pub fn validate(&self) -> FlowResult<()> {
        if self.components.is_empty() {
            return Err(FlowError::invalid_input(
                TelemetryClass::Health,
                "snapshot has no components",
            ));
        }
        if self.components.iter().any(|c| c.name.trim().is_empty()) {
            return Err(FlowError::invalid_input(
                TelemetryClass::Health,
                "component name is blank",
            ));
        }
        Ok(())
    }
}
