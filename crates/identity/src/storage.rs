//! Persistence of the signed-in Google profile
//!
//! The profile is stored as JSON in the platform config dir:
//! - Linux: ~/.config/userauth/session.json
//! - macOS: ~/Library/Application Support/com.demo.userauth/session.json
//! - Windows: %APPDATA%\demo\userauth\config\session.json
//!
//! Its presence is what makes `is_signed_in` true across restarts.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::tokens::TokenPair;
use crate::SignedInUser;

/// Storage format version (for future migrations)
const STORAGE_VERSION: u32 = 1;

/// The persisted signed-in state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// Version for schema migrations
    pub version: u32,

    pub user: SignedInUser,

    /// Kept only so sign-out can revoke it
    pub tokens: TokenPair,

    pub signed_in_at: DateTime<Utc>,
}

/// Handles persistent storage of the signed-in profile
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the platform default location
    pub fn from_default_path() -> Result<Self> {
        let path = common::platform::default_session_path()
            .ok_or_else(|| anyhow!("Could not determine config directory for your platform"))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored session, if any
    ///
    /// A corrupt file is treated as signed out rather than an error.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            debug!("No session file found");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<StoredSession>(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Ignoring unreadable session file {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, user: &SignedInUser, tokens: &TokenPair) -> Result<StoredSession> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let session = StoredSession {
            version: STORAGE_VERSION,
            user: user.clone(),
            tokens: tokens.clone(),
            signed_in_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, content)?;
        info!("Saved session for {}", user.email);
        Ok(session)
    }

    /// Removes the stored session; returns whether one existed
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        info!("Cleared stored session");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (SessionStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(temp_dir.path().join("nested").join("session.json"));
        (storage, temp_dir)
    }

    fn user() -> SignedInUser {
        SignedInUser {
            provider_id: "42".into(),
            email: "test@example.com".into(),
            display_name: Some("Test".into()),
            picture_url: None,
        }
    }

    fn tokens() -> TokenPair {
        TokenPair {
            access_token: "access".into(),
            refresh_token: None,
            id_token: Some("id".into()),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.load().unwrap().is_none());

        storage.save(&user(), &tokens()).unwrap();

        let session = storage.load().unwrap().unwrap();
        assert_eq!(session.version, STORAGE_VERSION);
        assert_eq!(session.user, user());
        assert_eq!(session.tokens.access_token, "access");
    }

    #[test]
    fn test_clear() {
        let (storage, _temp) = create_test_storage();
        storage.save(&user(), &tokens()).unwrap();

        assert!(storage.clear().unwrap());
        assert!(!storage.clear().unwrap());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_signed_out() {
        let (storage, _temp) = create_test_storage();
        std::fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        std::fs::write(storage.path(), "{ not json").unwrap();

        assert!(storage.load().unwrap().is_none());
    }
}
