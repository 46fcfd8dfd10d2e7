use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::platform;

/// Default loopback port for the Google OAuth redirect
pub const DEFAULT_CALLBACK_PORT: u16 = 51121;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a config directory for this platform")]
    NoConfigDir,

    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Explicit database file; the platform data dir is used when unset
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(platform::default_database_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_port: u16,
    pub scopes: Vec<String>,
}

impl GoogleConfig {
    /// Google sign-in is only offered once an OAuth client has been configured
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty()
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/oauth-callback", self.callback_port)
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_port: DEFAULT_CALLBACK_PORT,
            scopes: vec![
                "openid".to_string(),
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn resolved_file(&self) -> Option<PathBuf> {
        self.file.clone().or_else(platform::default_log_path)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Loads the config at `path`, falling back to defaults when the file is missing
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Loads the config at `path`, writing the defaults there first if the
    /// file does not exist yet so the user has a template to edit
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        config.save(path)?;
        info!("Wrote default config to {:?}", path);
        Ok(config)
    }

    /// Loads the config from the platform config path, creating it on first run
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = platform::get_config_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_or_init(&path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("config.toml")).unwrap();

        assert_eq!(config.google.callback_port, DEFAULT_CALLBACK_PORT);
        assert_eq!(config.logging.level, "info");
        assert!(!config.google.is_configured());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[google]\nclient_id = \"abc.apps.googleusercontent.com\"\n\n[database]\npath = \"/tmp/users.db\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.google.is_configured());
        assert_eq!(config.google.callback_port, DEFAULT_CALLBACK_PORT);
        assert_eq!(config.database.resolved_path(), Some(PathBuf::from("/tmp/users.db")));
        assert_eq!(config.google.redirect_uri(), "http://localhost:51121/oauth-callback");
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.logging.level = "debug".into();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("userauth").join("config.toml");

        let config = Config::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert!(!config.google.is_configured());

        std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
        let edited = Config::load_or_init(&path).unwrap();
        assert_eq!(edited.logging.level, "warn");
        assert_eq!(edited.google.callback_port, DEFAULT_CALLBACK_PORT);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[google\nclient_id = 1").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
