// Structured logging setup
use std::io::IsTerminal;

use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{Result, TelemetryError};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Level applied to `targets` when `RUST_LOG` is not set
    pub level: String,
    pub format: OutputFormat,
    /// Crates whose events are shown at `level`
    pub targets: Vec<&'static str>,
}

/// Filter directives used when `RUST_LOG` is absent
pub fn default_directives(options: &LoggingOptions) -> String {
    let level = options.level.to_ascii_lowercase();
    let mut directives: Vec<String> = options
        .targets
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    directives.push("hyper=warn".to_string());
    directives.join(",")
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails if the directives do not parse or a global subscriber is already set.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(options))
            .map_err(|e| TelemetryError::TracingError(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match options.format {
        OutputFormat::Pretty => {
            let use_colors = std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(use_colors),
                )
                .try_init()
        }
        OutputFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::TracingError(e.to_string()))
}
