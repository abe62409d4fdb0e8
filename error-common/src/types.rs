use thiserror::Error;

use crate::codes::{self, exit};

/// Top-level error for CertGuard processes
#[derive(Error, Debug)]
pub enum CertGuardError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Certificates were unusable before anything started serving
    #[error("Refused to start: {0}")]
    StartupRefused(String),

    /// The serving component failed independently of the watchdog
    #[error("Serving component error: {0}")]
    ServingError(String),

    /// Logging or metrics initialisation failed
    #[error("Telemetry error: {0}")]
    TelemetryError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CertGuardError {
    /// Stable error code for log correlation
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => codes::configuration::INVALID,
            Self::StartupRefused(_) => codes::certificates::STARTUP_REFUSED,
            Self::ServingError(_) => codes::serving::COMPONENT_FAILED,
            Self::TelemetryError(_) => codes::telemetry::INIT_FAILED,
            Self::Other(_) => codes::system::INTERNAL,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigError(_) => exit::CONFIG,
            Self::StartupRefused(_) => exit::STARTUP_REFUSED,
            Self::ServingError(_) | Self::TelemetryError(_) | Self::Other(_) => exit::FAILURE,
        }
    }
}

/// Result type alias for CertGuard operations
pub type Result<T> = std::result::Result<T, CertGuardError>;
