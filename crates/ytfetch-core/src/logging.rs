//! Tracing setup for the ytfetch client.
//!
//! Events go to `$XDG_STATE_HOME/ytfetch/ytfetch.log`. When that file cannot
//! be opened the CLI switches to `init_logging_stderr`, so a download never
//! fails for want of a log.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "ytfetch.log";

/// Used unless `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "info,ytfetch=debug,ytfetch_core=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log file location; its directory is created if missing.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ytfetch")?;
    xdg_dirs
        .place_state_file(LOG_FILE)
        .context("failed to create ytfetch state directory")
}

fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

/// Send download and transport events to the ytfetch log file.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = Arc::new(open_log(&path)?);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(file)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log = %path.display(),
        "ytfetch logging initialized"
    );
    Ok(())
}

/// Log to stderr. A subscriber that is already installed wins.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
