//! # Structured Logging Module
//!
//! Environment-aware structured logging for the flow-control layer. Console
//! output is human readable by default; set `TELEMETRY_FLOW_LOG_FORMAT=json` for
//! one JSON object per line. `RUST_LOG` overrides the environment's default level.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::TelemetryClass;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = use_json_format();

        let console = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A host application may already own the global subscriber
        if tracing_subscriber::registry().with(console).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var("TELEMETRY_FLOW_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "warn",
        _ => "debug",
    }
}

fn use_json_format() -> bool {
    std::env::var("TELEMETRY_FLOW_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log a dropped push with full context
pub fn log_rejected_push(class: TelemetryClass, reason: &str) {
    tracing::warn!(
        class = %class,
        reason = %reason,
        timestamp = %Utc::now().to_rfc3339(),
        "Dropped invalid telemetry push"
    );
}

/// Log a recovered controller fault
pub fn log_transform_fault(class: TelemetryClass, operation: &str, error: &str) {
    tracing::error!(
        class = %class,
        operation = %operation,
        error = %error,
        timestamp = %Utc::now().to_rfc3339(),
        "Flow controller fault recovered"
    );
}
