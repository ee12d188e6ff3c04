//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Check timing
    #[serde(default)]
    pub schedule: RawSchedule,

    /// License prompt settings
    #[serde(default)]
    pub prompt: RawPrompt,

    /// Known product variants, in lookup order. Built-in list when absent.
    #[serde(default)]
    pub variants: Option<Vec<RawVariant>>,

    /// Static view of the host's plugin registry
    #[serde(default)]
    pub host: RawHost,

    /// License oracle backend
    #[serde(default)]
    pub oracle: Option<RawOracle>,
}

/// Check timing settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSchedule {
    /// "normal" or "test"
    pub mode: Option<String>,

    /// Delay before the first check
    pub first_check_delay_seconds: Option<u64>,

    /// Delay before the second check and the start of the recurring checks
    pub second_check_delay_seconds: Option<u64>,

    /// Period of the recurring checks
    pub check_period_seconds: Option<u64>,
}

/// License prompt settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPrompt {
    /// Message shown alongside the license request
    pub message: Option<String>,
}

/// Product variant definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawVariant {
    /// Unique variant ID
    pub id: String,

    /// Plugin id under which this variant registers in the host
    pub plugin_id: String,

    #[serde(default)]
    pub requires_license: bool,

    /// Product code passed to the oracle (required when requires_license)
    pub product_code: Option<String>,
}

/// Host plugin registry contents
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawHost {
    /// Answer of the direct "which plugin owns this code" lookup
    pub owning_plugin: Option<String>,

    /// Plugin ids registered in the host
    #[serde(default)]
    pub registered_plugins: Vec<String>,
}

/// Oracle backend
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawOracle {
    /// Always answers the same result: "licensed", "not_licensed" or "unknown"
    Static { result: String },
    /// Asks a license server over HTTP
    Http {
        url: String,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
    },
}

fn default_timeout_seconds() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_variants_in_order() {
        let toml_str = r#"
            config_version = 1

            [[variants]]
            id = "paid"
            plugin_id = "com.example.paid"
            requires_license = true
            product_code = "PPAID"

            [[variants]]
            id = "free"
            plugin_id = "com.example.free"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        let variants = config.variants.unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].id, "paid");
        assert!(!variants[1].requires_license);
    }

    #[test]
    fn parse_http_oracle_with_default_timeout() {
        let toml_str = r#"
            config_version = 1

            [oracle]
            type = "http"
            url = "https://licenses.example.com/check"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        match config.oracle.unwrap() {
            RawOracle::Http { url, timeout_seconds } => {
                assert_eq!(url, "https://licenses.example.com/check");
                assert_eq!(timeout_seconds, 10);
            }
            other => panic!("unexpected oracle: {:?}", other),
        }
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.schedule.mode.is_none());
        assert!(config.variants.is_none());
        assert!(config.host.registered_plugins.is_empty());
        assert!(config.oracle.is_none());
    }
}
