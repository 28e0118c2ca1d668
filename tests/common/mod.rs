#![allow(dead_code)]

pub mod builders;
pub mod strategies;

pub use builders::*;

/// Install a test subscriber once; later calls are no-ops
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("telemetry_flow=debug")
        .with_test_writer()
        .try_init();
}
