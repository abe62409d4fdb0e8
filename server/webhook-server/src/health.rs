//! Health endpoints served under the certificate watchdog
//!
//! `/healthz` answers as long as the process is up. `/readyz` turns 503 as
//! soon as the cancellation fires, so load balancers drain the pod while
//! in-flight requests finish.

use anyhow::Context;
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use cert_watchdog::{CancellationSignal, ServingComponent};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_cause: Option<String>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn readiness(State(cancel): State<CancellationSignal>) -> (StatusCode, Json<ReadinessResponse>) {
    match cancel.cause() {
        None => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                shutdown_cause: None,
            }),
        ),
        Some(cause) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                shutdown_cause: Some(cause.to_string()),
            }),
        ),
    }
}

/// Create health check routes bound to `cancel`
pub fn router(cancel: CancellationSignal) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/readyz", get(readiness))
        .with_state(cancel)
}

/// HTTP health server that stops accepting connections on cancellation
pub struct HealthServer {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
}

impl HealthServer {
    /// Bind the listener up front so address errors surface before serving
    ///
    /// # Errors
    ///
    /// Fails if `addr` cannot be bound.
    pub async fn bind(addr: &str) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener: Some(listener),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl ServingComponent for HealthServer {
    async fn serve(&mut self, cancel: CancellationSignal) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .context("health server already served")?;

        info!(address = %self.local_addr, "health server listening");
        let shutdown = cancel.clone();
        axum::serve(listener, router(cancel))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("health server error")?;

        info!("health server stopped");
        Ok(())
    }
}
