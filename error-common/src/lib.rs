//! Common error handling utilities for CertGuard
//!
//! This crate provides the top-level error type shared by the CertGuard
//! crates, the stable error codes attached to it, and the mapping from a
//! fatal error to the process exit status a supervisor sees.
//!
//! # Error Categories
//!
//! - **ConfigError**: configuration could not be loaded or failed validation
//! - **StartupRefused**: certificates were already unusable at startup
//! - **ServingError**: the serving component failed on its own
//! - **TelemetryError**: logging or metrics could not be initialised
//!
//! # Example
//!
//! ```rust
//! use error_common::{CertGuardError, exit};
//!
//! let err = CertGuardError::StartupRefused("tls.crt expires before deadline".into());
//! assert_eq!(err.exit_code(), exit::STARTUP_REFUSED);
//! ```

pub mod types;
pub mod codes;
pub mod reporting;

pub use types::*;
pub use codes::*;
pub use reporting::*;
