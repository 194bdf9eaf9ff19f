// Supervisor log setup: console output mirrored to a timestamped file

use crate::error::{MasterError, Result};
use chrono::Local;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging for a supervising run.
///
/// Events go to the console and, ANSI-free, to a fresh
/// `apimaster_<timestamp>.log` inside `log_dir`. Filtering follows
/// `RUST_LOG`, defaulting to info. Returns the log file path.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;

    let file_name = format!("apimaster_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
    let path = log_dir.join(file_name);

    let file = File::create(&path).map_err(|e| {
        MasterError::LogFileError(format!("Failed to create supervisor log: {}", e))
    })?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .try_init()
        .map_err(|e| MasterError::LogError(format!("Failed to initialize logging: {}", e)))?;

    Ok(path)
}

/// Console-only logging, for commands that don't supervise anything
pub fn init_console() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer())
        .try_init()
        .map_err(|e| MasterError::LogError(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
