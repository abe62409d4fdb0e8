use clap::{Parser, Subcommand, ValueEnum};
use config_engine::{ConfigOverrides, LogFormat};
use std::path::PathBuf;

/// CertGuard webhook server
#[derive(Parser, Debug)]
#[command(name = "webhook-server", version)]
#[command(about = "Serves only while the mounted TLS certificates stay valid")]
pub struct Args {
    /// Configuration file path (TOML or YAML)
    #[arg(short, long, global = true, env = "CERTGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding tls.crt, tls.key and ca.crt
    #[arg(long, global = true)]
    pub cert_dir: Option<PathBuf>,

    /// DNS name the certificate must be issued for (empty disables the check)
    #[arg(long, global = true)]
    pub dns_name: Option<String>,

    /// Seconds between certificate re-checks
    #[arg(long, global = true, value_name = "SECS")]
    pub check_interval: Option<u64>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// Address the health server binds to
    #[arg(long, global = true)]
    pub listen_addr: Option<String>,

    /// Prometheus exporter address (empty disables it)
    #[arg(long, global = true)]
    pub metrics_addr: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Validate the certificates, then serve until cancelled (default)
    Serve,
    /// Validate the certificates once against the startup deadline and exit
    Check,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    /// Flags given on the command line, as the top configuration layer
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            cert_dir: self.cert_dir.clone(),
            dns_name: self.dns_name.clone(),
            check_interval_secs: self.check_interval,
            listen_addr: self.listen_addr.clone(),
            metrics_addr: self.metrics_addr.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format.map(LogFormat::from),
        }
    }
}
