//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::limits::LimitsConfig;
use super::listen::ListenConfig;
use super::security::SecurityConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Periodic timers.
    #[serde(default)]
    pub timers: TimersConfig,
    /// Line, buffer and queue limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Credential hashing configuration.
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name used in logs (e.g., "golem.example.org").
    pub name: String,
    /// Name of the world shown to players on entry.
    #[serde(default = "default_world_name")]
    pub world_name: String,
    /// Banner sent to every new connection. Built-in text when unset.
    pub greeting_file: Option<String>,
    /// Message of the day shown after login. Built-in text when unset.
    pub motd_file: Option<String>,
    /// Prometheus metrics HTTP port (0 disables).
    #[serde(default)]
    pub metrics_port: u16,
}

fn default_world_name() -> String {
    "Golem".to_string()
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "golem.db".to_string()
}

/// Timer configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize)]
pub struct TimersConfig {
    /// Milliseconds between output flushes (default: 50).
    #[serde(default = "default_output_flush_ms")]
    pub output_flush_ms: u64,
}

impl TimersConfig {
    /// The output flush period.
    pub fn output_flush(&self) -> Duration {
        Duration::from_millis(self.output_flush_ms)
    }
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            output_flush_ms: default_output_flush_ms(),
        }
    }
}

fn default_output_flush_ms() -> u64 {
    50
}
