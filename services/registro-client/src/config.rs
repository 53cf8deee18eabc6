//! Configuration types for the registration client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RegistroError, Result};

/// Client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Backend endpoints and request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// WebSocket base; the client connects to `{ws_url}/ws`
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: default_ws_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    /// Full WebSocket endpoint URL
    pub fn ws_endpoint(&self) -> String {
        format!("{}/ws", self.ws_url.trim_end_matches('/'))
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:3000".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Configuration for WebSocket reconnection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Reconnect automatically when the socket closes
    #[serde(default = "default_reconnect_enabled")]
    pub enabled: bool,
    /// Reconnect attempts allowed before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay before each reconnect attempt in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: default_reconnect_enabled(),
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_reconnect_enabled() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_interval_ms() -> u64 {
    1_000
}

/// Where client-local key/value state is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("registro-storage.json")
}

/// Admin panel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Password for the admin panel gate; `None` keeps the panel locked
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_stats_refresh_ms")]
    pub stats_refresh_ms: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: None,
            stats_refresh_ms: default_stats_refresh_ms(),
        }
    }
}

fn default_stats_refresh_ms() -> u64 {
    5_000
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RegistroError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    if config.admin.stats_refresh_ms == 0 {
        return Err(RegistroError::Config(
            "admin.stats_refresh_ms must be greater than zero".to_string(),
        ));
    }
    Ok(config)
}
