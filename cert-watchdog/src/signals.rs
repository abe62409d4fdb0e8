//! OS termination requests as a cancellation source

use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Termination request kinds honoured by the watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Something that delivers termination requests
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Wait for the next request; `None` means no more will arrive
    async fn recv(&mut self) -> Option<TerminationSignal>;
}

/// Process signal listener (SIGINT and SIGTERM; Ctrl-C off unix)
pub struct OsSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl OsSignals {
    /// Register the handlers; must be called inside a tokio runtime
    ///
    /// # Errors
    ///
    /// Fails if the OS refuses the signal registration.
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<TerminationSignal> {
        #[cfg(unix)]
        {
            tokio::select! {
                received = self.interrupt.recv() => received.map(|()| TerminationSignal::Interrupt),
                received = self.terminate.recv() => received.map(|()| TerminationSignal::Terminate),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .ok()
                .map(|()| TerminationSignal::Interrupt)
        }
    }
}

/// In-process signal delivery, used to inject termination requests
#[async_trait]
impl SignalSource for mpsc::Receiver<TerminationSignal> {
    async fn recv(&mut self) -> Option<TerminationSignal> {
        mpsc::Receiver::recv(self).await
    }
}
