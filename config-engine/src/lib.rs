//! Configuration loading for CertGuard
//!
//! Configuration is an explicit value built once at process startup and
//! passed down by reference. Sources are layered, later ones winning:
//!
//! - **Defaults**: compiled-in values matching the webhook deployment layout
//! - **File**: optional TOML or YAML file
//! - **Environment**: `CERTGUARD_*` variables
//! - **Overrides**: command-line flags
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{ConfigLoader, ConfigOverrides};
//!
//! let config = ConfigLoader::new()
//!     .file("certguard.toml")
//!     .overrides(ConfigOverrides {
//!         check_interval_secs: Some(60),
//!         ..Default::default()
//!     })
//!     .load()?;
//! println!("checking {} every {:?}", config.cert_dir.display(), config.check_interval());
//! # Ok::<(), config_engine::ConfigError>(())
//! ```

pub mod settings;
pub mod providers;
pub mod validation;
pub mod error;

pub use settings::*;
pub use providers::*;
pub use error::*;
