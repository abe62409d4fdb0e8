//! Certificate validity watchdog for TLS-serving processes
//!
//! A serving process presents a certificate, private key and CA bundle from
//! a directory that an external agent rotates. This crate:
//! - Refuses to start serving when the mounted material is already unusable
//! - Re-validates the material on a fixed interval against a forward-looking
//!   deadline, so expiry is caught before handshakes start failing
//! - Turns an invalid re-check or an OS termination request into one
//!   idempotent cancellation observed by the serving component
//!
//! The process is expected to run under a supervisor that restarts it once
//! rotated material is in place.
//!
//! # Components
//!
//! - [`validator`]: pure certificate store check against a [`ValidityDeadline`]
//! - [`watchdog`]: background loop driven by a timer and a [`SignalSource`]
//! - [`bootstrap`]: startup gate, then watchdog plus [`ServingComponent`]
//!
//! # Example
//!
//! ```rust,no_run
//! use cert_watchdog::{
//!     Bootstrap, BootstrapConfig, CancellationSignal, CertificateStoreRef, OsSignals,
//!     ServingComponent,
//! };
//!
//! struct Server;
//!
//! #[async_trait::async_trait]
//! impl ServingComponent for Server {
//!     async fn serve(&mut self, cancel: CancellationSignal) -> anyhow::Result<()> {
//!         cancel.cancelled().await;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = CertificateStoreRef::new("/etc/webhook/certs", "tls.crt", "tls.key", "ca.crt")?
//!         .with_dns_name("webhook.default.svc");
//!     let report = Bootstrap::new(store, BootstrapConfig::default())
//!         .run(Server, OsSignals::install()?)
//!         .await?;
//!     println!("stopped: {:?}", report.cause);
//!     Ok(())
//! }
//! ```

pub mod store;
pub mod deadline;
pub mod outcome;
pub mod validator;
pub mod clock;
pub mod cancellation;
pub mod signals;
pub mod watchdog;
pub mod bootstrap;
pub mod metrics;

pub use store::*;
pub use deadline::*;
pub use outcome::*;
pub use validator::{validate, validate_at};
pub use clock::*;
pub use cancellation::*;
pub use signals::*;
pub use watchdog::*;
pub use bootstrap::*;
