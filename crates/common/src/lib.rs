//! Configuration and platform paths shared by the UserAuth crates.

pub mod config;
pub mod platform;

pub use config::{Config, ConfigError, DatabaseConfig, GoogleConfig, LoggingConfig};
