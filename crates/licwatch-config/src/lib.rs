//! Configuration parsing and validation for licwatch
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Check timing (normal/test mode, explicit overrides)
//! - Product variant registry
//! - Host registry contents and oracle backend for the daemon
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

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

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use licwatch_host_api::CheckResult;
    use licwatch_util::PluginId;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let settings = parse_config("config_version = 1").unwrap();
        assert_eq!(settings.schedule, CheckSchedule::NORMAL);
        assert_eq!(settings.variants, builtin_variants());
        assert_eq!(settings.prompt.message, DEFAULT_PROMPT_MESSAGE);
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [schedule]
            mode = "test"

            [prompt]
            message = "Please buy a license"

            [[variants]]
            id = "paid"
            plugin_id = "com.example.paid"
            requires_license = true
            product_code = "PPAID"

            [host]
            registered_plugins = ["com.example.paid", "com.example.other"]

            [oracle]
            type = "static"
            result = "not_licensed"
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.schedule.first_delay, Duration::from_secs(3));
        assert_eq!(settings.prompt.message, "Please buy a license");
        assert_eq!(settings.variants.len(), 1);
        assert!(settings.variants[0].requires_license());
        assert_eq!(settings.host.owning_plugin, None);
        assert_eq!(
            settings.host.registered_plugins[0],
            PluginId::new("com.example.paid")
        );
        assert_eq!(
            settings.oracle,
            OracleSettings::Static {
                result: CheckResult::NotLicensed
            }
        );
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_mode() {
        let config = r#"
            config_version = 1

            [schedule]
            mode = "turbo"
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1").unwrap();
        writeln!(file, "[schedule]").unwrap();
        writeln!(file, "check_period_seconds = 600").unwrap();

        let settings = load_config(file.path()).unwrap();
        assert_eq!(settings.schedule.period, Duration::from_secs(600));
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
