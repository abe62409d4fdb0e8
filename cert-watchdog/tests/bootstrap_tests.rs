//! Startup gate and serving lifecycle

mod common;

use async_trait::async_trait;
use cert_watchdog::{
    Bootstrap, BootstrapConfig, BootstrapError, CancellationSignal, InvalidReason, ManualClock,
    ServingComponent, ShutdownCause, TerminationSignal, WatchdogConfig,
};
use chrono::TimeDelta;
use common::{store_valid_for, t0, TestCa, TestStore, TokioClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Records whether it was started, then waits for cancellation
#[derive(Default)]
struct FakeServer {
    started: Arc<AtomicBool>,
    fail_with: Option<&'static str>,
}

#[async_trait]
impl ServingComponent for FakeServer {
    async fn serve(&mut self, cancel: CancellationSignal) -> anyhow::Result<()> {
        self.started.store(true, Ordering::SeqCst);
        if let Some(message) = self.fail_with {
            anyhow::bail!(message);
        }
        cancel.cancelled().await;
        Ok(())
    }
}

fn config() -> BootstrapConfig {
    BootstrapConfig {
        startup_margin: Duration::from_secs(3600),
        watchdog: WatchdogConfig {
            check_interval: Duration::from_secs(300),
            recheck_margin: Duration::from_secs(60),
        },
    }
}

fn bootstrap(fixture: &TestStore) -> Bootstrap {
    Bootstrap::with_clock(fixture.store.clone(), config(), Arc::new(TokioClock::start()))
}

#[tokio::test(start_paused = true)]
async fn test_expired_certificate_refuses_start() {
    let ca = TestCa::long_lived();
    let leaf = ca.issue(&["localhost"], t0() - TimeDelta::days(90), t0() - TimeDelta::days(1));
    let fixture = TestStore::with(&leaf, &ca.pem());
    let server = FakeServer::default();
    let started = Arc::clone(&server.started);
    let (_tx, rx) = mpsc::channel::<TerminationSignal>(1);

    let result = bootstrap(&fixture).run(server, rx).await;

    match result {
        Err(BootstrapError::StartupRefused(InvalidReason::ExpiredByDeadline { .. })) => {}
        other => panic!("expected StartupRefused, got {other:?}"),
    }
    assert!(!started.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_certificate_expiring_within_startup_margin_refuses_start() {
    let fixture = store_valid_for(TimeDelta::minutes(30));
    let server = FakeServer::default();
    let started = Arc::clone(&server.started);
    let (_tx, rx) = mpsc::channel::<TerminationSignal>(1);

    let result = bootstrap(&fixture).run(server, rx).await;

    assert!(matches!(result, Err(BootstrapError::StartupRefused(_))));
    assert!(!started.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_missing_store_refuses_start() {
    let fixture = TestStore::empty();
    let (_tx, rx) = mpsc::channel::<TerminationSignal>(1);

    let result = bootstrap(&fixture).run(FakeServer::default(), rx).await;

    match result {
        Err(BootstrapError::StartupRefused(reason)) => assert_eq!(reason.kind(), "file_unreadable"),
        other => panic!("expected StartupRefused, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_valid_store_serves_until_signal() {
    let fixture = store_valid_for(TimeDelta::hours(24));
    let server = FakeServer::default();
    let started = Arc::clone(&server.started);
    let (tx, rx) = mpsc::channel(1);

    let run = tokio::spawn(bootstrap(&fixture).run(server, rx));
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert!(started.load(Ordering::SeqCst));
    assert!(!run.is_finished());

    tx.send(TerminationSignal::Terminate).await.unwrap();
    let report = run.await.unwrap().unwrap();
    assert_eq!(
        report.cause,
        Some(ShutdownCause::Signal(TerminationSignal::Terminate))
    );
}

#[tokio::test(start_paused = true)]
async fn test_expiry_during_serving_stops_with_certificate_cause() {
    // passes the 1h startup gate, fails the re-check at 60 min (deadline 66 min)
    let fixture = store_valid_for(TimeDelta::minutes(62));
    let (_tx, rx) = mpsc::channel::<TerminationSignal>(1);

    let report = bootstrap(&fixture).run(FakeServer::default(), rx).await.unwrap();

    match report.cause {
        Some(ShutdownCause::CertificatesInvalid(reason)) => {
            assert_eq!(reason.kind(), "expired_by_deadline");
        }
        other => panic!("unexpected cause: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_serving_failure_is_reported() {
    let fixture = store_valid_for(TimeDelta::hours(24));
    let server = FakeServer {
        started: Arc::default(),
        fail_with: Some("listener closed"),
    };
    let (_tx, rx) = mpsc::channel::<TerminationSignal>(1);

    let result = bootstrap(&fixture).run(server, rx).await;

    match result {
        Err(BootstrapError::ServingFailed(e)) => assert!(e.to_string().contains("listener closed")),
        other => panic!("expected ServingFailed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_preflight_does_not_start_anything() {
    let fixture = store_valid_for(TimeDelta::hours(24));
    let outcome = bootstrap(&fixture).preflight();
    assert!(outcome.is_valid());
}

#[test]
fn test_preflight_judges_startup_margin_at_current_time() {
    let fixture = store_valid_for(TimeDelta::hours(24));
    let clock = Arc::new(ManualClock::new(t0()));
    let gate = Bootstrap::with_clock(fixture.store.clone(), config(), clock.clone());
    assert!(gate.preflight().is_valid());

    // 30 minutes of validity left, less than the one hour startup margin
    clock.advance(TimeDelta::minutes(23 * 60 + 30));
    assert_eq!(
        gate.preflight().reason().map(InvalidReason::kind),
        Some("expired_by_deadline")
    );
}

#[tokio::test(start_paused = true)]
async fn test_admit_gates_before_anything_is_served() {
    let expired = store_valid_for(TimeDelta::minutes(10));
    assert!(matches!(
        bootstrap(&expired).admit(),
        Err(BootstrapError::StartupRefused(_))
    ));

    let fixture = store_valid_for(TimeDelta::hours(24));
    let admitted = bootstrap(&fixture).admit().unwrap();
    let (tx, rx) = mpsc::channel(1);
    tx.send(TerminationSignal::Interrupt).await.unwrap();

    let report = admitted.serve(FakeServer::default(), rx).await.unwrap();
    assert_eq!(
        report.cause,
        Some(ShutdownCause::Signal(TerminationSignal::Interrupt))
    );
}
