//! CertGuard webhook server
//!
//! Loads configuration, gates startup on the mounted certificates and serves
//! health endpoints under the certificate watchdog. The process exits when
//! the certificates are about to become invalid or a termination signal
//! arrives; its supervisor restarts it once rotated material is in place.

pub mod app;
pub mod cli;
pub mod health;

pub use app::{bootstrap_config, certificate_store, check, serve};
pub use cli::{Args, Command};
pub use health::{router, HealthServer};
