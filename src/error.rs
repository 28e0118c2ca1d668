//! Error types for the telemetry flow-control layer.
//!
//! None of these reach a producer: invalid input is logged and dropped at the
//! ingestion front-end, transform faults are logged and absorbed by the emission
//! task, and capacity pressure is resolved by eviction.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::constants::TelemetryClass;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Invalid {class} input: {reason}")]
    InvalidInput {
        class: TelemetryClass,
        reason: String,
    },
    #[error("Transform fault in {class} emission: {reason}")]
    TransformFault {
        class: TelemetryClass,
        reason: String,
    },
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl FlowError {
    pub fn invalid_input(class: TelemetryClass, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            class,
            reason: reason.into(),
        }
    }

    pub fn transform_fault(class: TelemetryClass, reason: impl Into<String>) -> Self {
        Self::TransformFault {
            class,
            reason: reason.into(),
        }
    }
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;
