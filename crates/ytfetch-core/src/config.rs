use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::DEFAULT_CHUNK_SIZE;

/// Environment variable holding the service base URL.
pub const SERVER_URL_ENV: &str = "YT_DLP_SERVER_URL";

/// Service base URL used when neither config nor environment sets one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Client configuration loaded from `~/.config/ytfetch/config.toml`.
///
/// Passed by value into `StreamingFetcher::new`; nothing in the core reads
/// the environment on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the download service (no trailing resource path).
    pub server_url: String,
    /// Staging write chunk size in bytes. Bounds memory per download.
    pub chunk_size: usize,
    /// TCP connect timeout in seconds. Unset = libcurl default. There is never a read timeout.
    pub connect_timeout_secs: Option<u64>,
    /// Honour `http_proxy`/`https_proxy`/`all_proxy` from the environment. Off by default:
    /// job traffic goes straight to `server_url`.
    pub inherit_proxy_env: bool,
    /// Delete the staging file when a download fails instead of leaving it for inspection.
    pub cleanup_on_failure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_secs: None,
            inherit_proxy_env: false,
            cleanup_on_failure: false,
        }
    }
}

impl ClientConfig {
    /// Apply environment overrides through `lookup` (normally `std::env::var(..).ok()`).
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(SERVER_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.server_url = url.to_string();
            }
        }
        self
    }

    /// Reject values the fetcher cannot work with.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.server_url)
            .with_context(|| format!("invalid server_url {:?}", self.server_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("server_url must be http or https, got {}", parsed.scheme());
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        Ok(())
    }

    /// `{server_url}/{resource}` with exactly one slash between them.
    pub fn endpoint(&self, resource: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            resource.trim_start_matches('/')
        )
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ytfetch")?;
    xdg_dirs
        .place_config_file("config.toml")
        .with_context(|| {
            format!(
                "failed to create config directory for {}",
                xdg_dirs.get_config_file("config.toml").display()
            )
        })
}

/// Load configuration from disk, creating a default file if none exists.
///
/// A config location that cannot be created (no HOME, read-only or bogus
/// XDG dir) is not fatal: defaults are used and a warning is logged. An
/// existing file that cannot be read or parsed is still an error.
pub fn load_or_init() -> Result<ClientConfig> {
    match config_path() {
        Ok(path) => load_or_init_at(&path),
        Err(e) => {
            tracing::warn!("no usable config location ({:#}); using defaults", e);
            Ok(ClientConfig::default())
        }
    }
}

/// `load_or_init` against an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<ClientConfig> {
    if path.exists() {
        return load_from_path(path);
    }
    let default_cfg = ClientConfig::default();
    match write_default(path, &default_cfg) {
        Ok(()) => tracing::info!("created default config at {}", path.display()),
        Err(e) => tracing::warn!("could not write default config ({:#}); using defaults", e),
    }
    Ok(default_cfg)
}

fn write_default(path: &Path, cfg: &ClientConfig) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<ClientConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let cfg: ClientConfig =
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}
