// Configuration validation
use std::net::SocketAddr;

use crate::error::{ConfigError, Result};
use crate::settings::CertGuardConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Upper bound for the interval and both margins: one year
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Reject configurations the watchdog cannot run with
pub fn validate(config: &CertGuardConfig) -> Result<()> {
    for (field, value) in [
        ("cert_name", &config.cert_name),
        ("key_name", &config.key_name),
        ("ca_name", &config.ca_name),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!("{field} must not be empty")));
        }
    }

    if config.cert_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError("cert_dir must not be empty".into()));
    }

    if config.check_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "check_interval_secs must be positive".into(),
        ));
    }

    for (field, value) in [
        ("check_interval_secs", config.check_interval_secs),
        ("startup_margin_secs", config.startup_margin_secs),
        ("recheck_margin_secs", config.recheck_margin_secs),
    ] {
        if value > MAX_DURATION_SECS {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be at most {MAX_DURATION_SECS}, got {value}"
            )));
        }
    }

    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "log_level must be one of {}, got {:?}",
            LOG_LEVELS.join(", "),
            config.log_level
        )));
    }

    parse_addr("listen_addr", &config.listen_addr)?;
    if let Some(addr) = config.metrics_addr() {
        parse_addr("metrics_addr", addr)?;
    }

    Ok(())
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| ConfigError::ValidationError(format!("{field} {value:?} is not a socket address: {e}")))
}
