//! On-disk credential storage.
//!
//! A logged-in credential is written as pretty JSON so a later run can skip
//! the QR login. The default file lives in the platform data directory.

use crate::credential::Credential;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    saved_at: DateTime<Utc>,
    credential: Credential,
}

/// Saves and loads one credential file.
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Store at the default location.
    pub fn new() -> Self {
        let data_dir = directories::ProjectDirs::from("com", "bili-passport", "bili-passport")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".bili-passport"));

        Self {
            path: data_dir.join("credential.json"),
        }
    }

    /// Store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential, `None` when nothing was saved yet.
    pub fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let stored: StoredCredential = serde_json::from_str(&contents)?;
        tracing::debug!(
            "Loaded credential saved at {} from {:?}",
            stored.saved_at,
            self.path
        );
        Ok(Some(stored.credential))
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredCredential {
            saved_at: Utc::now(),
            credential: credential.clone(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, contents)?;
        tracing::debug!("Saved credential to {:?}", self.path);
        Ok(())
    }

    /// Delete the stored credential if there is one.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
