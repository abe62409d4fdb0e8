use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing::info;

use cert_watchdog::OsSignals;
use config_engine::{CertGuardConfig, ConfigLoader, LogFormat};
use error_common::{exit, report_fatal, CertGuardError};
use telemetry::{init_logging, LoggingOptions, OutputFormat};
use webhook_server::{Args, Command};

const LOG_TARGETS: &[&str] = &["webhook_server", "cert_watchdog", "config_engine", "telemetry"];

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut loader = ConfigLoader::new().overrides(args.to_overrides());
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet; configuration decides how to log.
            eprintln!("{} {e}", "configuration error:".bright_red());
            return ExitCode::from(exit::CONFIG);
        }
    };

    if let Err(e) = init_logging(&logging_options(&config)) {
        eprintln!("{} {e}", "logging setup failed:".bright_red());
        return ExitCode::from(exit::FAILURE);
    }

    let result = match args.command() {
        Command::Serve => run_serve(&config).await,
        Command::Check => run_check(&config),
    };

    match result {
        Ok(()) => ExitCode::from(exit::SUCCESS),
        Err(e) => {
            report_fatal(command_name(args.command()), &e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn logging_options(config: &CertGuardConfig) -> LoggingOptions {
    LoggingOptions {
        level: config.log_level.clone(),
        format: match config.log_format {
            LogFormat::Pretty => OutputFormat::Pretty,
            LogFormat::Json => OutputFormat::Json,
        },
        targets: LOG_TARGETS.to_vec(),
    }
}

async fn run_serve(config: &CertGuardConfig) -> Result<(), CertGuardError> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        cert_dir = %config.cert_dir.display(),
        listen_addr = %config.listen_addr,
        "starting webhook server"
    );

    let signals = OsSignals::install()
        .map_err(|e| CertGuardError::ServingError(format!("failed to install signal handlers: {e}")))?;

    webhook_server::serve(config, signals).await?;
    Ok(())
}

fn run_check(config: &CertGuardConfig) -> Result<(), CertGuardError> {
    match webhook_server::check(config) {
        Ok(not_after) => {
            println!(
                "{} certificates in {} are valid until {}",
                "OK".bright_green(),
                config.cert_dir.display(),
                not_after.to_rfc3339()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {e}", "INVALID".bright_red());
            Err(e)
        }
    }
}

fn command_name(command: Command) -> &'static str {
    match command {
        Command::Serve => "serve",
        Command::Check => "check",
    }
}
