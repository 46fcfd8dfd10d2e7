use std::path::PathBuf;
use tracing::debug;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "demo";
const APPLICATION: &str = "userauth";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Gets the default configuration file path for UserAuth.
/// - Linux: ~/.config/userauth/config.toml
/// - macOS: ~/Library/Application Support/userauth/config.toml
/// - Windows: %APPDATA%/userauth/config.toml
pub fn get_config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join(APPLICATION).join("config.toml"))
}

/// Default location of the SQLite user database
pub fn default_database_path() -> Option<PathBuf> {
    let path = project_dirs()?.data_dir().join("users.db");
    debug!("Default database path: {:?}", path);
    Some(path)
}

/// Where the signed-in Google profile is persisted
pub fn default_session_path() -> Option<PathBuf> {
    Some(project_dirs()?.config_dir().join("session.json"))
}

/// The TUI owns the terminal, so logs go to a file
pub fn default_log_path() -> Option<PathBuf> {
    Some(project_dirs()?.data_local_dir().join("userauth.log"))
}
