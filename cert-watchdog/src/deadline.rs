//! Forward-looking validity deadlines

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::time::Duration;

/// Point in time the certificate must still be valid at
///
/// Validity is judged against this deadline rather than against "now", so
/// material that expires inside the lookahead window already counts as
/// invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValidityDeadline(DateTime<Utc>);

impl ValidityDeadline {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// `now + lookahead`, saturating at the latest representable instant
    pub fn after(now: DateTime<Utc>, lookahead: Duration) -> Self {
        let deadline = TimeDelta::from_std(lookahead)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self(deadline)
    }

    /// Deadline for the startup gate: `now + startup_margin`
    pub fn startup(now: DateTime<Utc>, startup_margin: Duration) -> Self {
        Self::after(now, startup_margin)
    }

    /// Deadline for a periodic re-check: `now + interval + recheck_margin`
    ///
    /// The next scheduled check must still have time to react before expiry.
    pub fn recheck(now: DateTime<Utc>, interval: Duration, recheck_margin: Duration) -> Self {
        Self::after(now, interval.saturating_add(recheck_margin))
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for ValidityDeadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
