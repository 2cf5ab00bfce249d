//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GovernanceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GovernanceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GovernanceConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_file() {
        let path = std::env::temp_dir().join("governance_config_valid.toml");
        fs::write(
            &path,
            r#"
                [rate_limit]
                max_requests = 25
                window_ms = 5000

                [versioning]
                default = "v1"
                latest = "v1"

                [[versioning.versions]]
                version = "v1"
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.rate_limit.default.max_requests, 25);
        assert_eq!(config.versioning.latest, "v1");

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_rejects_invalid_semantics() {
        let path = std::env::temp_dir().join("governance_config_invalid.toml");
        fs::write(
            &path,
            r#"
                [monitor]
                error_rate_percent = 0.0
            "#,
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/governance.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
