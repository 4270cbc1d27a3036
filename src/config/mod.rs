//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, DatabaseConfig, TimersConfig)
//! - [`listen`]: Network listener configuration (ListenConfig)
//! - [`limits`]: Input, output and queue limits (LimitsConfig)
//! - [`security`]: Credential hashing cost (SecurityConfig)
//! - [`texts`]: Greeting and message-of-the-day text loading
//! - [`validation`]: Startup validation of the loaded config

mod limits;
mod listen;
mod security;
mod texts;
mod types;
pub mod validation;

pub use limits::LimitsConfig;
pub use listen::ListenConfig;
pub use security::SecurityConfig;
pub use texts::Texts;
pub use types::{Config, ConfigError, DatabaseConfig, ServerConfig, TimersConfig};
