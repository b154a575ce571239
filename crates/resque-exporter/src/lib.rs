//! resque-exporter — Prometheus exporter for Resque.
//!
//! Wires the Redis backend and the scrape collector into an HTTP server:
//! - `GET <telemetry path>` runs one scrape and returns the exposition
//! - `GET /` serves a landing page linking to it
//!
//! # Configuration precedence
//!
//! ```text
//! defaults → --config.file (TOML) → command-line flags → REDIS_URL
//! ```

pub mod cli;
pub mod config;
pub mod logging;
pub mod server;

pub use config::{ExporterConfig, ExporterConfigError, LogFormat};
pub use server::build_router;

/// Version reported by `--version` and the build-info metric.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
