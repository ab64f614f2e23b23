pub mod config;
pub mod error;
pub mod preferences;

pub use config::{Config, UiConfig, ValidationResult, WeatherConfig};
pub use error::{AppError, ConfigError, PreferenceError, ReqwestErrorExt, WeatherError};
pub use preferences::PreferenceStore;

use anyhow::{Context, Result};
use std::path::Path;

/// Initialize tracing, writing to `log_path`.
///
/// The terminal belongs to the UI, so logs never go to stdout.
pub fn init(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    tracing::info!("Meteo core initialized");
    Ok(())
}
