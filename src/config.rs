//! Configuration management for hlsdeck
//!
//! Handles config file loading and endpoint resolution.
//! Config is stored at ~/.config/hlsdeck/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Backend used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Address the proxy binds to by default
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the video backend (serves /videos and /hls)
    pub backend_url: Option<String>,
    /// Socket address for `hlsdeck serve`
    pub listen: Option<String>,
    /// Where clients reach the proxy (defaults to http://<listen>)
    pub proxy_url: Option<String>,
    /// Preferred local player (mpv, vlc)
    pub player: Option<String>,
    /// Directory scanned by the local catalog endpoint
    pub local_catalog_dir: Option<PathBuf>,
}

impl Config {
    /// Get config file path (~/.config/hlsdeck/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hlsdeck").join("config.toml"))
    }

    /// Load config from the default file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit path
    ///
    /// Unlike [`Config::load`], a missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Backend base URL with fallback chain:
    /// 1. Environment variable HLSDECK_BACKEND_URL
    /// 2. Config file
    /// 3. http://localhost:5000
    pub fn backend_url(&self) -> String {
        let url = std::env::var("HLSDECK_BACKEND_URL")
            .ok()
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        trim_base(url)
    }

    /// Proxy bind address
    pub fn listen(&self) -> String {
        self.listen
            .clone()
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string())
    }

    /// Proxy base URL as seen by clients
    ///
    /// HLSDECK_PROXY_URL wins over the config file; without either, the
    /// listen address is used.
    pub fn proxy_url(&self) -> String {
        let url = std::env::var("HLSDECK_PROXY_URL")
            .ok()
            .or_else(|| self.proxy_url.clone())
            .unwrap_or_else(|| format!("http://{}", self.listen()));
        trim_base(url)
    }
}

/// Strip trailing slashes so paths can be appended with `format!`
pub fn trim_base(url: impl Into<String>) -> String {
    let url = url.into();
    url.trim_end_matches('/').to_string()
}
