//! Configuration validation

use crate::schema::{RawConfig, RawOracle, RawVariant};
use crate::settings::{TimingMode, effective_schedule};
use licwatch_host_api::CheckResult;
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Variant '{variant_id}': {message}")]
    VariantError { variant_id: String, message: String },

    #[error("Duplicate variant ID: {0}")]
    DuplicateVariantId(String),

    #[error("Plugin ID '{0}' is claimed by more than one variant")]
    DuplicatePluginId(String),

    #[error("Invalid schedule mode '{0}': expected \"normal\" or \"test\"")]
    InvalidScheduleMode(String),

    #[error("Schedule error: {0}")]
    ScheduleError(String),

    #[error("Oracle error: {0}")]
    OracleError(String),

    #[error("Prompt error: {0}")]
    PromptError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Schedule
    if let Some(mode) = &config.schedule.mode
        && parse_mode(mode).is_err()
    {
        errors.push(ValidationError::InvalidScheduleMode(mode.clone()));
    }
    if let Err(message) = effective_schedule(&config.schedule).check() {
        errors.push(ValidationError::ScheduleError(message));
    }

    // Variants
    if let Some(variants) = &config.variants {
        if variants.is_empty() {
            errors.push(ValidationError::VariantError {
                variant_id: String::new(),
                message: "variant list cannot be empty; omit it to use the built-in variants"
                    .into(),
            });
        }

        let mut seen_ids = HashSet::new();
        let mut seen_plugins = HashSet::new();
        for variant in variants {
            if !seen_ids.insert(&variant.id) {
                errors.push(ValidationError::DuplicateVariantId(variant.id.clone()));
            }
            if !seen_plugins.insert(&variant.plugin_id) {
                errors.push(ValidationError::DuplicatePluginId(variant.plugin_id.clone()));
            }
            errors.extend(validate_variant(variant));
        }
    }

    if let Some(message) = &config.prompt.message
        && message.trim().is_empty()
    {
        errors.push(ValidationError::PromptError("message cannot be empty".into()));
    }

    if let Some(oracle) = &config.oracle {
        errors.extend(validate_oracle(oracle));
    }

    errors
}

fn validate_variant(variant: &RawVariant) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if variant.id.is_empty() {
        errors.push(ValidationError::VariantError {
            variant_id: variant.id.clone(),
            message: "id cannot be empty".into(),
        });
    }

    if variant.plugin_id.is_empty() {
        errors.push(ValidationError::VariantError {
            variant_id: variant.id.clone(),
            message: "plugin_id cannot be empty".into(),
        });
    }

    if variant.requires_license {
        match variant.product_code.as_deref() {
            None | Some("") => errors.push(ValidationError::VariantError {
                variant_id: variant.id.clone(),
                message: "product_code is required when requires_license = true".into(),
            }),
            Some(_) => {}
        }
    }

    errors
}

fn validate_oracle(oracle: &RawOracle) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match oracle {
        RawOracle::Static { result } => {
            if let Err(e) = parse_check_result(result) {
                errors.push(ValidationError::OracleError(e));
            }
        }
        RawOracle::Http {
            url,
            timeout_seconds,
        } => {
            if url.is_empty() {
                errors.push(ValidationError::OracleError("url cannot be empty".into()));
            } else if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ValidationError::OracleError(format!(
                    "url '{}' must start with http:// or https://",
                    url
                )));
            }
            if *timeout_seconds == 0 {
                errors.push(ValidationError::OracleError(
                    "timeout_seconds must be greater than zero".into(),
                ));
            }
        }
    }

    errors
}

/// Parse schedule mode
pub fn parse_mode(s: &str) -> Result<TimingMode, String> {
    match s.to_lowercase().as_str() {
        "normal" => Ok(TimingMode::Normal),
        "test" => Ok(TimingMode::Test),
        other => Err(format!("Unknown schedule mode: {}", other)),
    }
}

/// Parse a static oracle result
pub fn parse_check_result(s: &str) -> Result<CheckResult, String> {
    match s.to_lowercase().as_str() {
        "licensed" => Ok(CheckResult::Licensed),
        "not_licensed" | "unlicensed" => Ok(CheckResult::NotLicensed),
        "unknown" => Ok(CheckResult::Unknown),
        other => Err(format!("Unknown check result: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawHost, RawPrompt, RawSchedule};

    fn config_with_variants(variants: Vec<RawVariant>) -> RawConfig {
        RawConfig {
            config_version: 1,
            schedule: RawSchedule::default(),
            prompt: RawPrompt::default(),
            variants: Some(variants),
            host: RawHost::default(),
            oracle: None,
        }
    }

    fn variant(id: &str, plugin_id: &str, code: Option<&str>) -> RawVariant {
        RawVariant {
            id: id.into(),
            plugin_id: plugin_id.into(),
            requires_license: code.is_some(),
            product_code: code.map(Into::into),
        }
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("normal").unwrap(), TimingMode::Normal);
        assert_eq!(parse_mode("TEST").unwrap(), TimingMode::Test);
        assert!(parse_mode("fast").is_err());
    }

    #[test]
    fn test_parse_check_result() {
        assert_eq!(parse_check_result("licensed").unwrap(), CheckResult::Licensed);
        assert_eq!(parse_check_result("not_licensed").unwrap(), CheckResult::NotLicensed);
        assert_eq!(parse_check_result("Unknown").unwrap(), CheckResult::Unknown);
        assert!(parse_check_result("maybe").is_err());
    }

    #[test]
    fn test_duplicate_id_detection() {
        let config = config_with_variants(vec![
            variant("paid", "com.example.a", Some("CODE")),
            variant("paid", "com.example.b", Some("CODE")),
        ]);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateVariantId(_))));
    }

    #[test]
    fn test_duplicate_plugin_detection() {
        let config = config_with_variants(vec![
            variant("paid", "com.example.a", Some("CODE")),
            variant("free", "com.example.a", None),
        ]);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicatePluginId(_))));
    }

    #[test]
    fn licensed_variant_needs_product_code() {
        let mut paid = variant("paid", "com.example.a", None);
        paid.requires_license = true;

        let errors = validate_config(&config_with_variants(vec![paid]));
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::VariantError { variant_id, .. } if variant_id == "paid"));
    }

    #[test]
    fn schedule_delays_must_be_ordered() {
        let mut config = config_with_variants(vec![variant("free", "com.example.a", None)]);
        config.schedule.first_check_delay_seconds = Some(7200);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ScheduleError(_))));
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut config = config_with_variants(vec![variant("free", "com.example.a", None)]);
        config.schedule.check_period_seconds = Some(0);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ScheduleError(_))));
    }

    #[test]
    fn oversized_delays_are_rejected() {
        let mut config = config_with_variants(vec![variant("free", "com.example.a", None)]);
        config.schedule.second_check_delay_seconds = Some(i64::MAX as u64);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ScheduleError(_))));

        let mut config = config_with_variants(vec![variant("free", "com.example.a", None)]);
        config.schedule.check_period_seconds = Some(u64::MAX);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ScheduleError(_))));
    }

    #[test]
    fn http_oracle_requires_url_scheme_and_timeout() {
        let errors = validate_oracle(&RawOracle::Http {
            url: "licenses.example.com".into(),
            timeout_seconds: 0,
        });
        assert_eq!(errors.len(), 2);
    }
}
