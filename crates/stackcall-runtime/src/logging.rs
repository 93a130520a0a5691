//! Logging bootstrap
//!
//! Installs a global `tracing` subscriber writing to stderr, configured from the
//! `[logging]` section of stackcall.toml. `RUST_LOG` takes precedence over the
//! configured level when set.

use stackcall_config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Level used when neither RUST_LOG nor the config sets one
pub const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to install log subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry();

    match config.format.unwrap_or_default() {
        LogFormat::Compact => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_filter(filter);
            registry.with(layer).try_init()?;
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_filter(filter);
            registry.with(layer).try_init()?;
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .json()
                .with_filter(filter);
            registry.with(layer).try_init()?;
        }
    }
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = config.level.as_deref().unwrap_or(DEFAULT_LEVEL);
    EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter {
        filter: level.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_configured_level_builds_filter() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: Some("debug".to_string()),
            format: None,
        };
        assert!(build_filter(&config).is_ok());
    }

    #[test]
    #[serial]
    fn test_invalid_level_is_reported() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: Some("stackcall=loud".to_string()),
            format: None,
        };
        assert!(matches!(
            build_filter(&config),
            Err(LoggingError::InvalidFilter { .. })
        ));
    }
}
