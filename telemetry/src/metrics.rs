// Prometheus exporter for the `metrics` facade
use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::error::{Result, TelemetryError};

/// Install the global recorder and serve `/metrics` on `addr`
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Fails if the address does not parse, the listener cannot be bound, or a
/// recorder is already installed.
pub fn install_prometheus(addr: &str) -> Result<SocketAddr> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| TelemetryError::ExporterError(format!("invalid metrics address {addr:?}: {e}")))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::ExporterError(e.to_string()))?;

    info!(address = %addr, "metrics exporter listening");
    Ok(addr)
}
