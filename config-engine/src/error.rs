use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration parsing failed: {0}")]
    ParseError(#[from] figment::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for error_common::CertGuardError {
    fn from(err: ConfigError) -> Self {
        error_common::CertGuardError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
