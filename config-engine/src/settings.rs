use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main CertGuard configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CertGuardConfig {
    /// Directory holding the mounted certificate material
    #[serde(default = "default_cert_dir")]
    pub cert_dir: PathBuf,

    /// Leaf certificate file name inside `cert_dir`
    #[serde(default = "default_cert_name")]
    pub cert_name: String,

    /// Private key file name inside `cert_dir`
    #[serde(default = "default_key_name")]
    pub key_name: String,

    /// CA bundle file name inside `cert_dir`
    #[serde(default = "default_ca_name")]
    pub ca_name: String,

    /// DNS name the leaf must be issued for (empty disables the check)
    #[serde(default = "default_dns_name")]
    pub dns_name: String,

    /// Periodic re-check interval in seconds (default: 300 = 5 minutes)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Lookahead applied to the startup check in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_startup_margin")]
    pub startup_margin_secs: u64,

    /// Extra lookahead on top of the interval for periodic checks (default: 60)
    #[serde(default = "default_recheck_margin")]
    pub recheck_margin_secs: u64,

    /// Address the serving component binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Prometheus exporter address (empty disables the exporter)
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,

    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, coloured when attached to a terminal
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

// Default value functions

fn default_cert_dir() -> PathBuf { PathBuf::from("/tmp/k8s-webhook-server/serving-certs") }
fn default_cert_name() -> String { "tls.crt".to_string() }
fn default_key_name() -> String { "tls.key".to_string() }
fn default_ca_name() -> String { "ca.crt".to_string() }
fn default_dns_name() -> String { "localhost".to_string() }

fn default_check_interval() -> u64 { 300 } // 5 minutes
fn default_startup_margin() -> u64 { 3600 } // 1 hour
fn default_recheck_margin() -> u64 { 60 } // 1 minute

fn default_listen_addr() -> String { "0.0.0.0:9443".to_string() }
fn default_metrics_addr() -> String { "0.0.0.0:8080".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for CertGuardConfig {
    fn default() -> Self {
        Self {
            cert_dir: default_cert_dir(),
            cert_name: default_cert_name(),
            key_name: default_key_name(),
            ca_name: default_ca_name(),
            dns_name: default_dns_name(),
            check_interval_secs: default_check_interval(),
            startup_margin_secs: default_startup_margin(),
            recheck_margin_secs: default_recheck_margin(),
            listen_addr: default_listen_addr(),
            metrics_addr: default_metrics_addr(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl CertGuardConfig {
    /// Get the periodic re-check interval
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Get the startup lookahead
    pub fn startup_margin(&self) -> Duration {
        Duration::from_secs(self.startup_margin_secs)
    }

    /// Get the periodic lookahead added on top of the interval
    pub fn recheck_margin(&self) -> Duration {
        Duration::from_secs(self.recheck_margin_secs)
    }

    /// DNS name to bind the leaf to, if hostname checking is enabled
    pub fn dns_name(&self) -> Option<&str> {
        let name = self.dns_name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Metrics exporter address, if the exporter is enabled
    pub fn metrics_addr(&self) -> Option<&str> {
        let addr = self.metrics_addr.trim();
        (!addr.is_empty()).then_some(addr)
    }
}
