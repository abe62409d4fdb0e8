// Configuration providers: defaults, file, environment, command-line overrides
use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::settings::{CertGuardConfig, LogFormat};
use crate::validation::validate;

/// Prefix for environment variable overrides, e.g. `CERTGUARD_CERT_DIR`
pub const ENV_PREFIX: &str = "CERTGUARD_";

/// Values supplied on the command line; `None` leaves lower layers untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_interval_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,
}

/// Builds a validated [`CertGuardConfig`] from layered sources
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    overrides: ConfigOverrides,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a TOML or YAML file layer; a missing file is skipped
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Assemble the layered figment without extracting it
    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(CertGuardConfig::default()));

        if let Some(path) = &self.file {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
            };
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(&self.overrides)))
    }

    /// Extract and validate the configuration
    pub fn load(&self) -> Result<CertGuardConfig> {
        let config: CertGuardConfig = self.figment()?.extract()?;
        validate(&config)?;
        debug!(
            cert_dir = %config.cert_dir.display(),
            check_interval_secs = config.check_interval_secs,
            "configuration loaded"
        );
        Ok(config)
    }
}
