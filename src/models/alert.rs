use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Fingerprint;
use crate::constants::TelemetryClass;
use crate::error::{FlowError, FlowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(AlertLevel::Info),
            "warning" => Ok(AlertLevel::Warning),
            "critical" => Ok(AlertLevel::Critical),
            other => Err(FlowError::invalid_input(
                TelemetryClass::Alerts,
                format!("unknown alert level '{other}'"),
            )),
        }
    }
}

/// Operational alert raised by a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub level: AlertLevel,
    pub message: String,
    pub component: String,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(level: AlertLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            component: component.into(),
            timestamp: Utc::now(),
            acknowledged: false,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Dedup key over (component, level, message)
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&(self.component.as_str(), self.level, self.message.as_str()))
    }

    pub fn validate(&self) -> FlowResult<()> {
        if self.message.trim().is_empty() {
            return Err(FlowError::invalid_input(
                TelemetryClass::Alerts,
                "alert message is blank",
            ));
        }
        if self.component.trim().is_empty() {
            return Err(FlowError::invalid_input(
                TelemetryClass::Alerts,
                "alert component is blank",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_ignores_id_and_timestamp() {
        let a = Alert::new(AlertLevel::Warning, "db", "replica lag");
        let b = Alert::new(AlertLevel::Warning, "db", "replica lag")
            .with_timestamp(a.timestamp + chrono::Duration::seconds(10));
        assert_ne!(a.id, b.id);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_distinguishes_level_component_message() {
        let base = Alert::new(AlertLevel::Warning, "db", "replica lag");
        assert_ne!(
            base.fingerprint(),
            Alert::new(AlertLevel::Critical, "db", "replica lag").fingerprint()
        );
        assert_ne!(
            base.fingerprint(),
            Alert::new(AlertLevel::Warning, "cache", "replica lag").fingerprint()
        );
        assert_ne!(
            base.fingerprint(),
            Alert::new(AlertLevel::Warning, "db", "disk full").fingerprint()
        );
    }

    #[test]
    fn test_validation() {
        assert!(Alert::new(AlertLevel::Info, "db", "ok").validate().is_ok());
        assert!(Alert::new(AlertLevel::Info, "db", " ").validate().is_err());
        assert!(Alert::new(AlertLevel::Info, "", "msg").validate().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let alert = Alert::new(AlertLevel::Critical, "api", "5xx spike");
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["level"], "critical");
        assert_eq!(json["acknowledged"], false);
    }
}
