//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FatalAction, LogFormat};

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.panic_check.on_write_failure, FatalAction::Exit);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [observability]
            log_level = "debug"
            log_format = "json"

            [panic_check]
            on_write_failure = "log"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.panic_check.on_write_failure, FatalAction::Log);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn unknown_fatal_action_is_a_parse_error() {
        let err = parse_config("[panic_check]\non_write_failure = \"retry\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_report_validation_errors() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/panic-check.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
