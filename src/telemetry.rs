//! # Telemetry
//!
//! Initializes the global `tracing` subscriber.
//!
//! `RUST_LOG` wins over `logging.level` when set.

use crate::config::{LogFormat, LoggingSettings};
use tracing_subscriber::EnvFilter;

/// Error returned when a global subscriber is already installed.
pub type TelemetryError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Builds the filter: `RUST_LOG` if set and valid, else the configured level.
#[must_use]
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber was already set.
pub fn init(settings: &LoggingSettings) -> Result<(), TelemetryError> {
    let filter = env_filter(settings);
    match settings.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_target(true)
            .with_env_filter(filter)
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(true)
            .with_env_filter(filter)
            .try_init()?,
    }
    tracing::info!(level = %settings.level, format = ?settings.format, "logging initialized");
    Ok(())
}
