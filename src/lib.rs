#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Telemetry Flow
//!
//! Real-time flow control for dashboard telemetry.
//!
//! ## Overview
//!
//! Producers of three telemetry classes (component health, performance metrics,
//! operational alerts) push as fast and as often as they like. Each class passes
//! through its own flow-control policy before reaching subscribers:
//!
//! - **Health**: throttled to one snapshot per interval; unchanged snapshots are
//!   suppressed until a staleness ceiling forces a refresh
//! - **Metrics**: averaged over fixed, non-overlapping windows
//! - **Alerts**: deduplicated by content and emitted as a full list once pushes
//!   go quiet
//!
//! ## Module Organization
//!
//! - [`flow`] - controllers, publish bus, statistics and the service front-end
//! - [`models`] - telemetry payloads and their fingerprints
//! - [`config`] - configuration sections and the layered loader
//! - [`error`] - structured error handling
//! - [`logging`] - structured logging initialisation
//!
//! ## Concurrency
//!
//! Every class owns its cache lock and its emission task; no lock spans classes.
//! Push operations never await and never fail visibly. Counters are atomics read
//! without locks.

pub mod config;
pub mod constants;
pub mod error;
pub mod flow;
pub mod logging;
pub mod models;
pub mod utils;

pub use config::{ConfigManager, FlowConfig};
pub use constants::TelemetryClass;
pub use error::{FlowError, FlowResult};
pub use flow::{FlowStatistics, Subscription, TelemetryFlowService};
