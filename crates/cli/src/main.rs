use std::process::ExitCode;

use anyhow::{anyhow, Result};
use q2d_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|error| anyhow!("invalid log filter `{}`: {error}", logging.level))?;

    // Logs go to stderr; stdout carries command output.
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("could not install log subscriber: {error}"))
}

fn main() -> ExitCode {
    // Commands report config problems themselves; logging falls back to defaults.
    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);

    if let Err(error) = init_logging(&logging) {
        eprintln!("q2d: logging disabled: {error:#}");
    }

    q2d_cli::run()
}
