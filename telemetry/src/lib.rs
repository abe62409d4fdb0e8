//! Observability setup for CertGuard
//!
//! - **Logs**: `tracing` subscriber with an `EnvFilter`, human readable or JSON
//! - **Metrics**: optional Prometheus exporter for the `metrics` facade
//!
//! Both are installed once from `main`; library crates only emit events.
//!
//! # Example
//!
//! ```rust,no_run
//! use telemetry::{init_logging, LoggingOptions, OutputFormat};
//!
//! init_logging(&LoggingOptions {
//!     level: "info".into(),
//!     format: OutputFormat::Json,
//!     targets: vec!["webhook_server", "cert_watchdog"],
//! })?;
//! # Ok::<(), telemetry::TelemetryError>(())
//! ```

pub mod logging;
pub mod metrics;
pub mod error;

pub use logging::*;
pub use metrics::*;
pub use error::*;
