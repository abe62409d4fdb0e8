// Wiring from loaded configuration to the watchdog and the health server
use chrono::{DateTime, Utc};
use tracing::info;

use cert_watchdog::{
    Bootstrap, BootstrapConfig, CertificateStoreRef, ShutdownReport, SignalSource, ValidationOutcome,
    WatchdogConfig,
};
use config_engine::CertGuardConfig;
use error_common::{CertGuardError, Result};
use telemetry::install_prometheus;

use crate::health::HealthServer;

/// Certificate store described by the configuration
///
/// # Errors
///
/// Fails with [`CertGuardError::ConfigError`] if a file name is empty.
pub fn certificate_store(config: &CertGuardConfig) -> Result<CertificateStoreRef> {
    let store = CertificateStoreRef::new(&config.cert_dir, &config.cert_name, &config.key_name, &config.ca_name)
        .map_err(|e| CertGuardError::ConfigError(e.to_string()))?;

    Ok(match config.dns_name() {
        Some(dns_name) => store.with_dns_name(dns_name),
        None => store,
    })
}

pub fn bootstrap_config(config: &CertGuardConfig) -> BootstrapConfig {
    BootstrapConfig {
        startup_margin: config.startup_margin(),
        watchdog: WatchdogConfig {
            check_interval: config.check_interval(),
            recheck_margin: config.recheck_margin(),
        },
    }
}

/// Gate on the certificates, then serve health endpoints until cancelled
///
/// The metrics exporter and the health listener are bound only after the
/// startup gate has passed.
///
/// # Errors
///
/// [`CertGuardError::StartupRefused`] when the certificates are unusable,
/// [`CertGuardError::TelemetryError`] when the exporter cannot be installed,
/// [`CertGuardError::ServingError`] when the listener cannot be bound or
/// the server fails.
pub async fn serve<S: SignalSource>(config: &CertGuardConfig, signals: S) -> Result<ShutdownReport> {
    let admitted = Bootstrap::new(certificate_store(config)?, bootstrap_config(config)).admit()?;

    if let Some(addr) = config.metrics_addr() {
        install_prometheus(addr)?;
    }
    cert_watchdog::metrics::describe();

    let server = HealthServer::bind(&config.listen_addr)
        .await
        .map_err(|e| CertGuardError::ServingError(format!("{e:#}")))?;

    let report = admitted.serve(server, signals).await?;
    if let Some(cause) = &report.cause {
        info!(cause = %cause, "shutdown complete");
    }
    Ok(report)
}

/// Validate once against the startup deadline
///
/// # Errors
///
/// [`CertGuardError::StartupRefused`] carrying the reason when the
/// certificates would not pass the startup gate.
pub fn check(config: &CertGuardConfig) -> Result<DateTime<Utc>> {
    let bootstrap = Bootstrap::new(certificate_store(config)?, bootstrap_config(config));
    match bootstrap.preflight() {
        ValidationOutcome::Valid { not_after } => Ok(not_after),
        ValidationOutcome::Invalid(reason) => Err(CertGuardError::StartupRefused(reason.to_string())),
    }
}
