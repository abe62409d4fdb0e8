//! Watchdog metrics, emitted through the `metrics` facade
//!
//! Nothing is recorded unless the binary installs a recorder.

use chrono::{DateTime, Utc};
use ::metrics::{counter, describe_counter, describe_gauge, gauge, Unit};

use crate::cancellation::ShutdownCause;
use crate::outcome::ValidationOutcome;

pub const CHECKS_TOTAL: &str = "certguard_checks_total";
pub const SHUTDOWNS_TOTAL: &str = "certguard_shutdowns_total";
pub const CERTIFICATE_EXPIRY_SECONDS: &str = "certguard_certificate_expiry_seconds";

/// Which check produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    Startup,
    Recheck,
}

impl CheckPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Recheck => "recheck",
        }
    }
}

/// Register metric descriptions with the installed recorder
pub fn describe() {
    describe_counter!(CHECKS_TOTAL, "Certificate store validations by phase and outcome");
    describe_counter!(SHUTDOWNS_TOTAL, "Cancellations fired by the watchdog, by cause");
    describe_gauge!(
        CERTIFICATE_EXPIRY_SECONDS,
        Unit::Seconds,
        "Seconds until the serving certificate's not-after"
    );
}

pub(crate) fn record_check(phase: CheckPhase, outcome: &ValidationOutcome, now: DateTime<Utc>) {
    let label = match outcome {
        ValidationOutcome::Valid { not_after } => {
            #[allow(clippy::cast_precision_loss)]
            let remaining = (*not_after - now).num_seconds() as f64;
            gauge!(CERTIFICATE_EXPIRY_SECONDS).set(remaining);
            "valid"
        }
        ValidationOutcome::Invalid(reason) => reason.kind(),
    };
    counter!(CHECKS_TOTAL, "phase" => phase.as_str(), "outcome" => label).increment(1);
}

pub(crate) fn record_shutdown(cause: &ShutdownCause) {
    counter!(SHUTDOWNS_TOTAL, "cause" => cause.label()).increment(1);
}
