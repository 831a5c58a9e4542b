//! Configuration management for the Helm FTP server
//!
//! All values are static for the lifetime of a server run: they are read
//! once at process start from `config.toml` (optional) with `HELM_FTP_*`
//! environment overrides, and are not reloadable while running.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::Permissions;

/// Server configuration loaded at process start.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the FTP control connection
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Default port for the FTP control connection
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username of the single configured account
    #[serde(default = "default_username")]
    pub username: String,

    /// Password of the single configured account
    #[serde(default = "default_password")]
    pub password: String,

    /// Root directory the account is homed in
    #[serde(default = "default_server_root")]
    pub server_root: String,

    /// Permission mask granted to the account (pyftpdlib-style flags)
    #[serde(default = "default_permissions")]
    pub permissions: String,

    /// Maximum concurrent client sessions
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,

    /// Bounded wait for sessions to close during `stop()`
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Maximum FTP command line length
    #[serde(default = "default_max_command_length")]
    pub max_command_length: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2121
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin".to_string()
}

fn default_server_root() -> String {
    "./server_root".to_string()
}

fn default_permissions() -> String {
    "elradfmw".to_string()
}

fn default_max_clients() -> usize {
    10
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

fn default_max_command_length() -> usize {
    512
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            username: default_username(),
            password: default_password(),
            server_root: default_server_root(),
            permissions: default_permissions(),
            max_clients: default_max_clients(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            max_command_length: default_max_command_length(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml (if present) with environment
    /// overrides. Missing values fall back to defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("HELM_FTP").separator("_"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.username.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "username cannot be empty".into(),
            ));
        }

        if self.password.is_empty() {
            return Err(config::ConfigError::Message(
                "password cannot be empty".into(),
            ));
        }

        if self.server_root.is_empty() {
            return Err(config::ConfigError::Message(
                "server_root cannot be empty".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if let Err(e) = Permissions::from_mask(&self.permissions) {
            return Err(config::ConfigError::Message(format!(
                "invalid permission mask: {}",
                e
            )));
        }

        Ok(())
    }

    /// Get server root as PathBuf
    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    /// Bounded wait applied to session shutdown during `stop()`
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
