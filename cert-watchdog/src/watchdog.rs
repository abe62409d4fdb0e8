//! Periodic certificate re-validation
//!
//! State machine: `Idle -> Running -> Stopped`. While running, the loop waits
//! on three things at once:
//! - a termination signal, which fires the cancellation unconditionally
//! - cancellation fired elsewhere, which just stops the loop
//! - the re-check timer, which validates against
//!   `now + check_interval + recheck_margin` and fires the cancellation on
//!   any invalid outcome
//!
//! Re-checks run on the blocking pool. An interval that cannot be scheduled
//! disables re-checks while signals and cancellation are still serviced.
//!
//! A failed re-check is never retried; the process is expected to be
//! restarted by its supervisor once rotated material is in place.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use error_common::codes;

use crate::cancellation::{CancellationSignal, ShutdownCause};
use crate::clock::{Clock, SystemClock};
use crate::deadline::ValidityDeadline;
use crate::metrics::{record_check, record_shutdown, CheckPhase};
use crate::outcome::{InvalidReason, ValidationOutcome};
use crate::signals::SignalSource;
use crate::store::CertificateStoreRef;
use crate::validator::validate_at;

/// Re-check timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    /// Time between re-checks (default: 5 minutes)
    pub check_interval: Duration,
    /// Extra lookahead on top of the interval (default: 1 minute)
    pub recheck_margin: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(5 * 60),
            recheck_margin: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Idle,
    Running,
    /// Terminal
    Stopped,
}

pub struct Watchdog {
    store: CertificateStoreRef,
    config: WatchdogConfig,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<WatchdogState>>,
}

impl Watchdog {
    pub fn new(store: CertificateStoreRef, config: WatchdogConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: CertificateStoreRef, config: WatchdogConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
            state: Arc::new(Mutex::new(WatchdogState::Idle)),
        }
    }

    pub fn state(&self) -> WatchdogState {
        *self.state.lock()
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    pub fn recheck_deadline(&self, now: chrono::DateTime<chrono::Utc>) -> ValidityDeadline {
        ValidityDeadline::recheck(now, self.config.check_interval, self.config.recheck_margin)
    }

    /// Run one periodic check against the re-check deadline
    pub fn check_once(&self) -> ValidationOutcome {
        recheck(&self.store, self.config, self.clock.as_ref())
    }

    /// [`check_once`](Self::check_once) on the blocking pool
    ///
    /// File reads and signature checks stay off the runtime workers. A check
    /// that cannot complete counts as invalid.
    async fn check_off_runtime(&self) -> ValidationOutcome {
        let store = self.store.clone();
        let config = self.config;
        let clock = Arc::clone(&self.clock);
        match tokio::task::spawn_blocking(move || recheck(&store, config, clock.as_ref())).await {
            Ok(outcome) => outcome,
            Err(e) => ValidationOutcome::Invalid(InvalidReason::Unparsable {
                file: self.store.cert_path(),
                detail: format!("validation task failed: {e}"),
            }),
        }
    }

    /// Start the loop on the current tokio runtime
    ///
    /// Consumes the watchdog, so it can only be started once. The first tick
    /// happens one interval from now; the startup check is the bootstrap's.
    pub fn spawn<S: SignalSource>(self, cancel: CancellationSignal, signals: S) -> WatchdogHandle {
        *self.state.lock() = WatchdogState::Running;
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(self.run(cancel, signals));
        WatchdogHandle { task, state }
    }

    async fn run<S: SignalSource>(self, cancel: CancellationSignal, mut signals: S) {
        let _stopped = StopOnExit(Arc::clone(&self.state));
        let period = self.config.check_interval;
        let mut ticker = schedule(period);
        let mut signals_open = true;

        if ticker.is_none() {
            warn!(
                check_interval_secs = period.as_secs(),
                "check interval cannot be scheduled, periodic re-checks disabled"
            );
        }

        info!(
            cert_dir = %self.store.dir().display(),
            check_interval_secs = period.as_secs(),
            recheck_margin_secs = self.config.recheck_margin.as_secs(),
            "certificate watchdog running"
        );

        loop {
            tokio::select! {
                biased;

                received = signals.recv(), if signals_open => match received {
                    Some(signal) => {
                        warn!(signal = %signal, "termination signal received, shutting down");
                        self.shutdown(&cancel, ShutdownCause::Signal(signal));
                        break;
                    }
                    None => {
                        debug!("signal source closed");
                        signals_open = false;
                    }
                },

                () = cancel.cancelled() => {
                    debug!(cause = ?cancel.cause(), "cancellation observed, watchdog stopping");
                    break;
                }

                () = next_tick(&mut ticker) => {
                    if let ValidationOutcome::Invalid(reason) = self.check_off_runtime().await {
                        error!(
                            reason = %reason,
                            kind = reason.kind(),
                            error_code = codes::certificates::INVALID_AT_RECHECK,
                            "certificates invalid, shutting down"
                        );
                        self.shutdown(&cancel, ShutdownCause::CertificatesInvalid(reason));
                        break;
                    }
                }
            }
        }
    }

    /// Fire `cause`; returns `false` if an earlier cause already fired
    fn shutdown(&self, cancel: &CancellationSignal, cause: ShutdownCause) -> bool {
        if cancel.fire(cause) {
            if let Some(fired) = cancel.cause() {
                record_shutdown(fired);
            }
            true
        } else {
            debug!(cause = ?cancel.cause(), "cancellation already fired");
            false
        }
    }
}

fn recheck(store: &CertificateStoreRef, config: WatchdogConfig, clock: &dyn Clock) -> ValidationOutcome {
    let now = clock.now();
    let deadline = ValidityDeadline::recheck(now, config.check_interval, config.recheck_margin);
    debug!(cert_dir = %store.dir().display(), deadline = %deadline, "validating certificates");

    let outcome = validate_at(store, deadline, now);
    record_check(CheckPhase::Recheck, &outcome, now);
    if let ValidationOutcome::Valid { not_after } = &outcome {
        info!(not_after = %not_after, deadline = %deadline, "certificates are valid");
    }
    outcome
}

/// Ticker whose first tick is one period from now; `None` if the period is
/// zero or lands past the runtime clock's range
fn schedule(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let first = Instant::now().checked_add(period)?;
    let mut ticker = interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticker)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Marks the watchdog stopped however the loop exits, unwinding included
struct StopOnExit(Arc<Mutex<WatchdogState>>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        *self.0.lock() = WatchdogState::Stopped;
    }
}

/// Handle to a running watchdog loop
pub struct WatchdogHandle {
    task: JoinHandle<()>,
    state: Arc<Mutex<WatchdogState>>,
}

impl WatchdogHandle {
    pub fn state(&self) -> WatchdogState {
        *self.state.lock()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to stop on its own
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "watchdog task ended abnormally");
        }
        *self.state.lock() = WatchdogState::Stopped;
    }

    /// Stop the loop without firing the cancellation
    pub async fn stop(self) {
        self.task.abort();
        match self.task.await {
            Err(e) if !e.is_cancelled() => warn!(error = %e, "watchdog task ended abnormally"),
            _ => {}
        }
        *self.state.lock() = WatchdogState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::TerminationSignal;
    use tokio::sync::mpsc;

    fn store() -> CertificateStoreRef {
        CertificateStoreRef::new("/nonexistent/certguard", "tls.crt", "tls.key", "ca.crt").unwrap()
    }

    #[test]
    fn test_new_watchdog_is_idle() {
        let watchdog = Watchdog::new(store(), WatchdogConfig::default());
        assert_eq!(watchdog.state(), WatchdogState::Idle);
    }

    #[test]
    fn test_recheck_deadline_looks_past_next_tick() {
        let watchdog = Watchdog::new(store(), WatchdogConfig::default());
        let now = chrono::Utc::now();
        let deadline = watchdog.recheck_deadline(now);
        assert_eq!(deadline.instant() - now, chrono::TimeDelta::minutes(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_store_cancels_on_first_tick() {
        let config = WatchdogConfig {
            check_interval: Duration::from_secs(60),
            recheck_margin: Duration::from_secs(10),
        };
        let cancel = CancellationSignal::new();
        let (_tx, rx) = mpsc::channel::<TerminationSignal>(1);
        let started = Instant::now();

        let handle = Watchdog::new(store(), config).spawn(cancel.clone(), rx);
        assert_eq!(handle.state(), WatchdogState::Running);

        cancel.cancelled().await;
        assert_eq!(started.elapsed(), Duration::from_secs(60));
        assert!(matches!(cancel.cause(), Some(ShutdownCause::CertificatesInvalid(_))));

        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_cancellation_stops_loop_without_cause_change() {
        let cancel = CancellationSignal::new();
        let (_tx, rx) = mpsc::channel::<TerminationSignal>(1);
        let handle = Watchdog::new(store(), WatchdogConfig::default()).spawn(cancel.clone(), rx);

        cancel.fire(ShutdownCause::Signal(TerminationSignal::Interrupt));
        handle.join().await;
        assert_eq!(
            cancel.cause(),
            Some(&ShutdownCause::Signal(TerminationSignal::Interrupt))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_does_not_fire() {
        let cancel = CancellationSignal::new();
        let (_tx, rx) = mpsc::channel::<TerminationSignal>(1);
        let handle = Watchdog::new(store(), WatchdogConfig::default()).spawn(cancel.clone(), rx);

        handle.stop().await;
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unschedulable_interval_still_honors_signals() {
        let config = WatchdogConfig {
            check_interval: Duration::from_secs(u64::MAX),
            recheck_margin: Duration::from_secs(60),
        };
        let cancel = CancellationSignal::new();
        let (tx, rx) = mpsc::channel(1);
        let handle = Watchdog::new(store(), config).spawn(cancel.clone(), rx);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(!cancel.is_cancelled());
        assert!(!handle.is_finished());

        tx.send(TerminationSignal::Terminate).await.unwrap();
        handle.join().await;
        assert_eq!(
            cancel.cause(),
            Some(&ShutdownCause::Signal(TerminationSignal::Terminate))
        );
    }

    #[tokio::test]
    async fn test_zero_interval_is_not_scheduled() {
        assert!(schedule(Duration::ZERO).is_none());
        assert!(schedule(Duration::from_secs(u64::MAX)).is_none());
        assert!(schedule(Duration::from_secs(60)).is_some());
    }

    #[test]
    fn test_loop_exit_marks_stopped() {
        let state = Arc::new(Mutex::new(WatchdogState::Running));
        drop(StopOnExit(Arc::clone(&state)));
        assert_eq!(*state.lock(), WatchdogState::Stopped);
    }

    #[test]
    fn test_second_shutdown_keeps_first_cause() {
        let watchdog = Watchdog::new(store(), WatchdogConfig::default());
        let cancel = CancellationSignal::new();

        assert!(watchdog.shutdown(&cancel, ShutdownCause::Signal(TerminationSignal::Interrupt)));
        assert!(!watchdog.shutdown(&cancel, ShutdownCause::Signal(TerminationSignal::Terminate)));
        assert_eq!(
            cancel.cause(),
            Some(&ShutdownCause::Signal(TerminationSignal::Interrupt))
        );
    }

    #[tokio::test]
    async fn test_off_runtime_check_matches_inline_check() {
        let watchdog = Watchdog::new(store(), WatchdogConfig::default());
        let inline = watchdog.check_once();
        let blocking = watchdog.check_off_runtime().await;
        assert_eq!(inline.reason().map(InvalidReason::kind), Some("file_unreadable"));
        assert_eq!(blocking, inline);
    }
}
