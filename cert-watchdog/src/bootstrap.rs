//! Startup sequencing
//!
//! 1. Validate synchronously against `now + startup_margin`; refuse to start
//!    on any invalid outcome ([`Bootstrap::admit`]). Nothing is bound or
//!    spawned before this passes.
//! 2. Create the cancellation signal and start the watchdog on it.
//! 3. Run the serving component with the same signal until it returns.
//! 4. Stop the watchdog and report how serving ended.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use error_common::{codes, CertGuardError};

use crate::cancellation::{CancellationSignal, ShutdownCause};
use crate::clock::{Clock, SystemClock};
use crate::deadline::ValidityDeadline;
use crate::metrics::{record_check, CheckPhase};
use crate::outcome::{InvalidReason, ValidationOutcome};
use crate::signals::SignalSource;
use crate::store::CertificateStoreRef;
use crate::validator::validate_at;
use crate::watchdog::{Watchdog, WatchdogConfig};

/// The component that actually serves traffic
///
/// It must stop accepting work and return once `cancel` fires. The watchdog
/// makes no assumption about what it serves.
#[async_trait]
pub trait ServingComponent: Send {
    async fn serve(&mut self, cancel: CancellationSignal) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Lookahead for the startup check (default: 1 hour)
    pub startup_margin: Duration,
    pub watchdog: WatchdogConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            startup_margin: Duration::from_secs(3600),
            watchdog: WatchdogConfig::default(),
        }
    }
}

/// How a serving run ended without failing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// What fired the cancellation, if anything did before serving returned
    pub cause: Option<ShutdownCause>,
}

#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Certificates were already unusable; nothing was started
    #[error("refusing to start: {0}")]
    StartupRefused(InvalidReason),

    #[error("serving component failed: {0:#}")]
    ServingFailed(#[source] anyhow::Error),
}

impl From<BootstrapError> for CertGuardError {
    fn from(err: BootstrapError) -> Self {
        match err {
            BootstrapError::StartupRefused(reason) => CertGuardError::StartupRefused(reason.to_string()),
            BootstrapError::ServingFailed(e) => CertGuardError::ServingError(format!("{e:#}")),
        }
    }
}

pub struct Bootstrap {
    store: CertificateStoreRef,
    config: BootstrapConfig,
    clock: Arc<dyn Clock>,
}

impl Bootstrap {
    pub fn new(store: CertificateStoreRef, config: BootstrapConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: CertificateStoreRef, config: BootstrapConfig, clock: Arc<dyn Clock>) -> Self {
        Self { store, config, clock }
    }

    pub fn store(&self) -> &CertificateStoreRef {
        &self.store
    }

    /// The startup gate on its own: validate against `now + startup_margin`
    pub fn preflight(&self) -> ValidationOutcome {
        let now = self.clock.now();
        let deadline = ValidityDeadline::startup(now, self.config.startup_margin);
        info!(cert_dir = %self.store.dir().display(), deadline = %deadline, "validating certificates");

        let outcome = validate_at(&self.store, deadline, now);
        record_check(CheckPhase::Startup, &outcome, now);
        outcome
    }

    /// Run the startup gate, consuming the bootstrap
    ///
    /// Nothing is started here; callers bind listeners only after this
    /// returns `Ok`.
    ///
    /// # Errors
    ///
    /// [`BootstrapError::StartupRefused`] if the certificates are unusable
    /// through `now + startup_margin`.
    pub fn admit(self) -> Result<Admitted, BootstrapError> {
        match self.preflight() {
            ValidationOutcome::Valid { not_after } => {
                info!(not_after = %not_after, "certificates are valid");
                Ok(Admitted {
                    store: self.store,
                    config: self.config,
                    clock: self.clock,
                })
            }
            ValidationOutcome::Invalid(reason) => {
                error!(
                    reason = %reason,
                    kind = reason.kind(),
                    error_code = codes::certificates::STARTUP_REFUSED,
                    "certificates unusable, refusing to start"
                );
                Err(BootstrapError::StartupRefused(reason))
            }
        }
    }

    /// Gate, then serve under the watchdog until the serving component returns
    ///
    /// # Errors
    ///
    /// [`BootstrapError::StartupRefused`] if the startup check fails (the
    /// serving component is never started), [`BootstrapError::ServingFailed`]
    /// if the serving component returns an error.
    pub async fn run<C, S>(self, serving: C, signals: S) -> Result<ShutdownReport, BootstrapError>
    where
        C: ServingComponent,
        S: SignalSource,
    {
        self.admit()?.serve(serving, signals).await
    }
}

/// A bootstrap whose startup gate has passed
pub struct Admitted {
    store: CertificateStoreRef,
    config: BootstrapConfig,
    clock: Arc<dyn Clock>,
}

impl Admitted {
    /// Start the watchdog and serve until the serving component returns
    ///
    /// # Errors
    ///
    /// [`BootstrapError::ServingFailed`] if the serving component returns an error.
    pub async fn serve<C, S>(self, mut serving: C, signals: S) -> Result<ShutdownReport, BootstrapError>
    where
        C: ServingComponent,
        S: SignalSource,
    {
        let cancel = CancellationSignal::new();
        let watchdog = Watchdog::with_clock(self.store, self.config.watchdog, self.clock)
            .spawn(cancel.clone(), signals);

        info!("starting serving component");
        let result = serving.serve(cancel.clone()).await;
        watchdog.stop().await;

        match result {
            Ok(()) => {
                match cancel.cause() {
                    Some(cause) => info!(cause = %cause, "serving component stopped"),
                    None => warn!("serving component returned without cancellation"),
                }
                Ok(ShutdownReport {
                    cause: cancel.cause().cloned(),
                })
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "serving component failed");
                Err(BootstrapError::ServingFailed(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_margins_are_distinct() {
        let config = BootstrapConfig::default();
        assert_eq!(config.startup_margin, Duration::from_secs(3600));
        assert_eq!(config.watchdog.recheck_margin, Duration::from_secs(60));
    }

    #[test]
    fn test_errors_map_to_distinct_exit_codes() {
        let refused: CertGuardError = BootstrapError::StartupRefused(InvalidReason::HostnameMismatch {
            dns_name: "localhost".into(),
        })
        .into();
        let failed: CertGuardError = BootstrapError::ServingFailed(anyhow::anyhow!("bind failed")).into();

        assert_eq!(refused.exit_code(), error_common::exit::STARTUP_REFUSED);
        assert_eq!(failed.exit_code(), error_common::exit::FAILURE);
        assert!(failed.to_string().contains("bind failed"));
    }
}
