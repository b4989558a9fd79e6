//! `tracing-subscriber` setup.
//!
//! `RUST_LOG` wins when it is set; otherwise the `[logging] level` directive
//! from `catalog.toml` is used.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use super::config::LoggingConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {directive:?}: {reason}")]
    InvalidFilter { directive: String, reason: String },

    /// A global subscriber is already installed (tests, embedding hosts).
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialised,
}

/// Builds the filter for `config`, preferring `RUST_LOG` when present.
///
/// # Errors
///
/// [`LoggingError::InvalidFilter`] if the configured directive does not parse.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| LoggingError::InvalidFilter {
        directive: config.level.clone(),
        reason: e.to_string(),
    })
}

/// Installs the global fmt subscriber.
///
/// # Errors
///
/// [`LoggingError::InvalidFilter`] for a bad directive and
/// [`LoggingError::AlreadyInitialised`] if a subscriber is already set.
pub fn try_init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialised)
}
