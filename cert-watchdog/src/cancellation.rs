//! One-shot, idempotent shutdown trigger shared by the watchdog and the
//! serving component

use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

use crate::outcome::InvalidReason;
use crate::signals::TerminationSignal;

/// What fired the cancellation first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A periodic re-check found the certificates unusable
    CertificatesInvalid(InvalidReason),
    /// The process was asked to stop
    Signal(TerminationSignal),
}

impl ShutdownCause {
    /// Short stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::CertificatesInvalid(_) => "certificates_invalid",
            Self::Signal(_) => "signal",
        }
    }
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CertificatesInvalid(reason) => write!(f, "certificates invalid: {reason}"),
            Self::Signal(signal) => write!(f, "received {signal}"),
        }
    }
}

/// Cancellation context handed to the serving component
///
/// Cloning shares the same latch. The first [`fire`](Self::fire) wins and
/// records its cause; later calls have no effect. Waiters are woken without
/// polling.
#[derive(Clone)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

struct Inner {
    cause: OnceLock<ShutdownCause>,
    latch: watch::Sender<bool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        let (latch, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                cause: OnceLock::new(),
                latch,
            }),
        }
    }

    /// Fire the signal; returns `true` only for the call that actually fired it
    pub fn fire(&self, cause: ShutdownCause) -> bool {
        if self.inner.cause.set(cause).is_err() {
            return false;
        }
        self.inner.latch.send_replace(true);
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cause.get().is_some()
    }

    /// The cause recorded by the first firing
    pub fn cause(&self) -> Option<&ShutdownCause> {
        self.inner.cause.get()
    }

    /// Resolve once the signal has fired
    pub async fn cancelled(&self) {
        let mut fired = self.inner.latch.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = fired.wait_for(|fired| *fired).await;
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSignal")
            .field("cause", &self.cause())
            .finish()
    }
}
