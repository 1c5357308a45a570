//! Configuration parsing and validation for lockind
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Service paths and check interval
//! - Lockdown defaults and limits
//! - Extra alias groups
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<LockinConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<LockinConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No config file, using defaults");
        return Ok(LockinConfig::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<LockinConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(LockinConfig::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let config = parse_config("config_version = 1").unwrap();

        assert!(config.aliases.include_builtin);
        assert!(config.aliases.groups.is_empty());
        assert_eq!(config.service.check_interval, Duration::from_secs(60));
        assert_eq!(config.lockdown.max_duration_minutes, 720);
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [service]
            socket_path = "/tmp/lockin-test/lockind.sock"
            data_dir = "/tmp/lockin-test"
            check_interval_minutes = 2

            [lockdown]
            default_allowlist = ["https://GitHub.com/"]
            max_duration_minutes = 90

            [aliases]
            include_builtin = false

            [[aliases.groups]]
            domains = ["example.com", "www.example.com"]
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(
            config.service.rules_path,
            std::path::PathBuf::from("/tmp/lockin-test/rules.json")
        );
        assert_eq!(config.service.check_interval, Duration::from_secs(120));
        assert_eq!(config.lockdown.default_allowlist[0].as_str(), "github.com");
        assert!(config.lockdown.allows_duration(90));
        assert!(!config.lockdown.allows_duration(91));
        assert!(!config.aliases.include_builtin);
        assert_eq!(config.aliases.groups[0].len(), 2);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [service]
            check_interval_minutes = 0
        "#;

        let result = parse_config(config);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed { ref errors }) if errors.len() == 1
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(config.aliases.include_builtin);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_version = 1\n[lockdown]\nmax_duration_minutes = 30\n")
            .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.lockdown.max_duration_minutes, 30);
    }
}
