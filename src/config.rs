//! Service configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ServiceConfig::database_path`].
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

/// Runtime configuration of the game service.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Public base URL used in reminder links.
    #[serde(default = "default_public_url")]
    public_url: String,

    /// From address of reminder mail.
    #[serde(default = "default_mail_sender")]
    mail_sender: String,

    /// Directory reminder mail is spooled to.
    #[serde(default = "default_mail_spool_dir")]
    mail_spool_dir: PathBuf,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    log_filter: String,
}

fn default_database_path() -> String {
    "tictactoe.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_mail_sender() -> String {
    "noreply@tictactoe.local".to_string()
}

fn default_mail_spool_dir() -> PathBuf {
    PathBuf::from("mail_spool")
}

fn default_log_filter() -> String {
    "info,tictactoe_api=debug".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            mail_sender: default_mail_sender(),
            mail_spool_dir: default_mail_spool_dir(),
            log_filter: default_log_filter(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(database = %config.database_path, port = config.port, "Config loaded");
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise, then applies
    /// environment overrides.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Applies `DATABASE_PATH` if set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(DATABASE_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => self.with_database_path(path),
            _ => self,
        }
    }

    /// Filter to install once the configuration is loaded, or `None` when
    /// `RUST_LOG` is set and keeps precedence.
    pub fn log_filter_override(&self, rust_log: Option<&str>) -> Option<&str> {
        match rust_log {
            Some(directives) if !directives.trim().is_empty() => None,
            _ => Some(self.log_filter.as_str()),
        }
    }

    /// Replaces the database path.
    pub fn with_database_path(mut self, database_path: String) -> Self {
        debug!(database_path = %database_path, "Database path overridden");
        self.database_path = database_path;
        self
    }

    /// Replaces the bind address parts that are given.
    pub fn with_bind(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
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
