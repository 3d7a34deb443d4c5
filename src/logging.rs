use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use color_eyre::eyre::{Result, eyre};
use tracing::Level;

use crate::config::LoggingConfig;

/// Installs a JSON subscriber writing to the configured log file.
///
/// The terminal belongs to the dashboard, so without a file nothing is
/// installed and events are discarded. Returns whether logging is active.
pub fn init(config: &LoggingConfig, file_override: Option<&Path>) -> Result<bool> {
    let Some(path) = file_override.or(config.file.as_deref()) else {
        return Ok(false);
    };
    ensure_parent_dir(path)?;
    let file = File::create(path)?;

    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .json()
        .with_max_level(parse_level(&config.level))
        .with_writer(Mutex::new(file))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| eyre!("failed to set tracing subscriber: {e}"))?;
    Ok(true)
}

pub fn parse_level(level: &str) -> Level {
    level.parse().unwrap_or(Level::INFO)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
