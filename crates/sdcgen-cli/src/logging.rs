//! Subscriber installation for the binary.

use anyhow::{anyhow, Result};
use sdcgen_common::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level; output always goes to stderr.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("invalid log level '{}': {e}", config.level))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => subscriber
            .json()
            .with_timer(tracing_subscriber::fmt::time::uptime())
            .try_init(),
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Pretty => subscriber.pretty().try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// Merge the command-line logging flags over `base`.
pub fn resolve(base: &LoggingConfig, level: Option<&str>, format: Option<LogFormat>) -> LoggingConfig {
    LoggingConfig {
        level: level.map(str::to_string).unwrap_or_else(|| base.level.clone()),
        format: format.unwrap_or(base.format),
    }
}
