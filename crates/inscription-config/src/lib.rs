#![deny(unsafe_code)]

//! Configuration loading and validation for the inscription server.
//!
//! Loads TOML configuration files and validates them. [`AppConfig`] is the
//! single configuration value handed to the server at startup; nothing in the
//! server derives paths or addresses on its own.
//!
//! ## TOML Example
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 1337
//! backlog = 1
//! read_timeout_secs = 30
//! write_timeout_secs = 30
//!
//! [storage]
//! catalog_path = "data/cours.txt"
//! registrations_path = "data/inscription.txt"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Flat-file storage locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the listening socket and per-connection deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host the server binds to (and the client connects to).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Listen backlog. The server only ever serves one connection at a time.
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    /// Maximum wait for each object read from a client (0 = wait forever).
    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Maximum wait for each object written to a client (0 = wait forever).
    #[serde(default = "default_timeout_secs")]
    pub write_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog: default_backlog(),
            read_timeout_secs: default_timeout_secs(),
            write_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, suitable for `lookup_host` / `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        secs_to_timeout(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        secs_to_timeout(self.write_timeout_secs)
    }
}

fn secs_to_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1337
}

fn default_backlog() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

/// Locations of the course listing and the registration log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Tab-delimited course listing (`code \t name \t session`).
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Append-only registration log.
    #[serde(default = "default_registrations_path")]
    pub registrations_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            registrations_path: default_registrations_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/cours.txt")
}

fn default_registrations_path() -> PathBuf {
    PathBuf::from("data/inscription.txt")
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.server.host.is_empty() {
            return Err(ConfigError::Validation(
                "server.host must not be empty".to_string(),
            ));
        }
        if self.server.backlog == 0 {
            return Err(ConfigError::Validation(
                "server.backlog must be at least 1".to_string(),
            ));
        }

        if self.storage.catalog_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.catalog_path must not be empty".to_string(),
            ));
        }
        if self.storage.registrations_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.registrations_path must not be empty".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}
