//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Build the filter directive for a configured level
pub fn filter_directive(crate_name: &str, level: &str) -> Result<String> {
    let level = level.trim().to_ascii_lowercase();
    if !VALID_LEVELS.contains(&level.as_str()) {
        return Err(Error::InvalidInput(format!("Unknown log level: {}", level)));
    }
    Ok(format!("{}={},bibjoin_common={}", crate_name, level, level))
}

/// Install the global subscriber
///
/// Logs go to stderr unless `config.file` is set, in which case they are
/// appended to that file without ANSI colors.
pub fn init_logging(crate_name: &str, config: &LoggingConfig) -> Result<()> {
    let directive = filter_directive(crate_name, &config.level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))
}
