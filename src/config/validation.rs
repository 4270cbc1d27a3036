//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.world_name is required")]
    MissingWorldName,
    #[error("timers.output_flush_ms must be greater than zero")]
    ZeroFlushPeriod,
    #[error("limits.max_line_len must be between 64 and {max}, got {got}")]
    InvalidLineLimit { got: usize, max: usize },
    #[error("limits.page_lines must be greater than zero")]
    ZeroPageLines,
    #[error("limits.output_buffer_capacity ({0}) is smaller than one input line")]
    OutputBufferTooSmall(usize),
    #[error("limits.inbox_capacity must be greater than zero")]
    ZeroInboxCapacity,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }
    if config.server.world_name.trim().is_empty() {
        errors.push(ValidationError::MissingWorldName);
    }

    if config.timers.output_flush_ms == 0 {
        errors.push(ValidationError::ZeroFlushPeriod);
    }

    let limits = &config.limits;
    if !(64..=golem_proto::MAX_LINE_LEN).contains(&limits.max_line_len) {
        errors.push(ValidationError::InvalidLineLimit {
            got: limits.max_line_len,
            max: golem_proto::MAX_LINE_LEN,
        });
    }
    if limits.page_lines == 0 {
        errors.push(ValidationError::ZeroPageLines);
    }
    if limits.output_buffer_capacity < limits.max_line_len {
        errors.push(ValidationError::OutputBufferTooSmall(
            limits.output_buffer_capacity,
        ));
    }
    if limits.inbox_capacity == 0 {
        errors.push(ValidationError::ZeroInboxCapacity);
    }

    let db_path = Path::new(&config.database.path);
    if config.database.path != ":memory:"
        && let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::DatabasePathInvalid(
            config.database.path.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        toml::from_str(
            r#"
[server]
name = "golem.test"

[listen]
address = "127.0.0.1:4000"

[database]
path = ":memory:"
"#,
        )
        .unwrap()
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&base()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = base();
        config.server.name = String::new();
        config.timers.output_flush_ms = 0;
        config.limits.page_lines = 0;
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::MissingServerName));
        assert!(matches!(errors[1], ValidationError::ZeroFlushPeriod));
        assert!(matches!(errors[2], ValidationError::ZeroPageLines));
    }

    #[test]
    fn line_limit_above_protocol_cap_is_rejected() {
        let mut config = base();
        config.limits.max_line_len = 4096;
        let errors = validate(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidLineLimit { got: 4096, max: 512 }
        ));
    }

    #[test]
    fn missing_database_directory_is_rejected() {
        let mut config = base();
        config.database.path = "/nonexistent/golem/golem.db".to_string();
        let errors = validate(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::DatabasePathInvalid(_)));
    }
}
