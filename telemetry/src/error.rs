use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Tracing initialization failed: {0}")]
    TracingError(String),

    #[error("Metrics exporter error: {0}")]
    ExporterError(String),
}

impl From<TelemetryError> for error_common::CertGuardError {
    fn from(err: TelemetryError) -> Self {
        error_common::CertGuardError::TelemetryError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
