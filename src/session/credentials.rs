//! Credential persistence.
//!
//! The session reads and replaces credentials only through [`CredentialStore`],
//! so tests and embedders can supply their own storage.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Access and refresh tokens for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Username the tokens were issued to.
    username: String,
    /// Short-lived access token sent with `/auth`.
    token: String,
    /// Long-lived token exchanged for new credentials.
    refresh_token: String,
}

/// Credential storage error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Credential error: {} at {}:{}", message, file, line)]
pub struct CredentialError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CredentialError {
    /// Creates a new credential error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Where the session keeps its credentials.
pub trait CredentialStore {
    /// The stored credentials, if any.
    fn load(&self) -> Option<Credentials>;

    /// Replaces the stored credentials.
    fn store(&mut self, credentials: Credentials) -> Result<(), CredentialError>;

    /// Removes all stored credentials.
    fn clear(&mut self) -> Result<(), CredentialError>;

    /// The stored access token.
    fn access_token(&self) -> Option<String> {
        self.load().map(|c| c.token)
    }

    /// The stored refresh token.
    fn refresh_token(&self) -> Option<String> {
        self.load().map(|c| c.refresh_token)
    }

    /// The stored username.
    fn username(&self) -> Option<String> {
        self.load().map(|c| c.username)
    }
}

/// Keeps credentials in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    credentials: Option<Credentials>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `credentials`.
    pub fn with(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credentials> {
        self.credentials.clone()
    }

    fn store(&mut self, credentials: Credentials) -> Result<(), CredentialError> {
        self.credentials = Some(credentials);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        self.credentials = None;
        Ok(())
    }
}

/// Keeps credentials in a JSON file, cached in memory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    cached: Option<Credentials>,
}

impl FileCredentialStore {
    /// Opens the store at `path`. A missing file means no credentials.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let path = path.as_ref().to_path_buf();
        let cached = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let credentials: Credentials = serde_json::from_str(&content).map_err(|e| {
                    CredentialError::new(format!("Failed to parse credentials: {}", e))
                })?;
                debug!(username = %credentials.username, "Loaded stored credentials");
                Some(credentials)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No credentials file");
                None
            }
            Err(e) => {
                return Err(CredentialError::new(format!(
                    "Failed to read credentials file: {}",
                    e
                )));
            }
        };
        Ok(Self { path, cached })
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credentials> {
        self.cached.clone()
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    fn store(&mut self, credentials: Credentials) -> Result<(), CredentialError> {
        let content = serde_json::to_string_pretty(&credentials)
            .map_err(|e| CredentialError::new(format!("Failed to encode credentials: {}", e)))?;
        std::fs::write(&self.path, content)
            .map_err(|e| CredentialError::new(format!("Failed to write credentials: {}", e)))?;
        info!("Credentials saved");
        self.cached = Some(credentials);
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&mut self) -> Result<(), CredentialError> {
        self.cached = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Credentials cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(error = %e, "Failed to remove credentials file");
                Err(CredentialError::new(format!(
                    "Failed to remove credentials file: {}",
                    e
                )))
            }
        }
    }
}
