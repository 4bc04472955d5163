//! Client configuration.

use crate::session::ReconnectPolicy;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Overrides `server_url`.
pub const ENV_SERVER_URL: &str = "CHECKERS_SERVER_URL";
/// Overrides `refresh_url`.
pub const ENV_REFRESH_URL: &str = "CHECKERS_REFRESH_URL";
/// Overrides `credentials_path`.
pub const ENV_CREDENTIALS: &str = "CHECKERS_CREDENTIALS";

/// Settings for the checkers client.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the game server.
    #[serde(default = "default_server_url")]
    server_url: String,

    /// Token refresh endpoint.
    #[serde(default = "default_refresh_url")]
    refresh_url: String,

    /// JSON file holding the user's tokens.
    #[serde(default = "default_credentials_path")]
    credentials_path: PathBuf,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    log_filter: String,

    /// Reconnect backoff.
    #[serde(default)]
    reconnect: ReconnectPolicy,
}

fn default_server_url() -> String {
    "ws://localhost:8080/ws".to_string()
}

fn default_refresh_url() -> String {
    "http://localhost:8080/api/auth/refresh".to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_log_filter() -> String {
    "info,checkers_client=debug".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            refresh_url: default_refresh_url(),
            credentials_path: default_credentials_path(),
            log_filter: default_log_filter(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(server_url = %config.server_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise defaults, then applies
    /// environment overrides.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            debug!("No config file, using defaults");
            Self::default()
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_SERVER_URL) {
            debug!(%url, "Server URL overridden");
            self.server_url = url;
        }
        if let Some(url) = lookup(ENV_REFRESH_URL) {
            debug!(%url, "Refresh URL overridden");
            self.refresh_url = url;
        }
        if let Some(path) = lookup(ENV_CREDENTIALS) {
            debug!(%path, "Credentials path overridden");
            self.credentials_path = PathBuf::from(path);
        }
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
