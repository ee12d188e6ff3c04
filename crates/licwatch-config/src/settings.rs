//! Validated settings structures

use crate::schema::{RawConfig, RawHost, RawOracle, RawSchedule, RawVariant};
use crate::validation::{parse_check_result, parse_mode};
use licwatch_host_api::CheckResult;
use licwatch_util::{PluginId, ProductCode, VariantId};
use std::fmt;
use std::time::Duration;

/// Message shown with the license request when the config has none
pub const DEFAULT_PROMPT_MESSAGE: &str =
    "A license is required to use this plugin. Please activate your license.";

/// Validated settings ready for use by the scheduler
#[derive(Debug, Clone)]
pub struct Settings {
    pub schedule: CheckSchedule,
    pub prompt: PromptSettings,
    /// Known variants, in lookup order
    pub variants: Vec<ProductVariant>,
    pub host: HostSettings,
    pub oracle: OracleSettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let variants = raw
            .variants
            .map(|v| v.into_iter().map(ProductVariant::from_raw).collect())
            .unwrap_or_else(builtin_variants);

        Self {
            schedule: effective_schedule(&raw.schedule),
            prompt: PromptSettings {
                message: raw
                    .prompt
                    .message
                    .unwrap_or_else(|| DEFAULT_PROMPT_MESSAGE.to_string()),
            },
            variants,
            host: HostSettings::from_raw(raw.host),
            oracle: raw
                .oracle
                .map(OracleSettings::from_raw)
                .unwrap_or_default(),
        }
    }

    /// Replace the schedule with the constants of `mode`
    pub fn with_timing_mode(mut self, mode: TimingMode) -> Self {
        self.schedule = CheckSchedule::for_mode(mode);
        self
    }

}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schedule: CheckSchedule::for_mode(TimingMode::Normal),
            prompt: PromptSettings::default(),
            variants: builtin_variants(),
            host: HostSettings::default(),
            oracle: OracleSettings::default(),
        }
    }
}

/// Which set of timing constants to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    #[default]
    Normal,
    /// Short delays for manual and automated testing
    Test,
}

/// When license checks run: a one-shot at `first_delay`, a one-shot at
/// `second_delay`, and a repeating check every `period` starting at
/// `second_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSchedule {
    pub first_delay: Duration,
    pub second_delay: Duration,
    pub period: Duration,
}

impl CheckSchedule {
    pub const NORMAL: CheckSchedule = CheckSchedule {
        first_delay: Duration::from_secs(60),
        second_delay: Duration::from_secs(3600),
        period: Duration::from_secs(3 * 3600),
    };

    pub const TEST: CheckSchedule = CheckSchedule {
        first_delay: Duration::from_secs(3),
        second_delay: Duration::from_secs(30),
        period: Duration::from_secs(180),
    };

    /// Longest accepted delay or period (one year)
    pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 3600);

    pub fn for_mode(mode: TimingMode) -> Self {
        match mode {
            TimingMode::Normal => Self::NORMAL,
            TimingMode::Test => Self::TEST,
        }
    }

    /// Check ordering constraints, returning a description of the first violation
    pub fn check(&self) -> Result<(), String> {
        if self.first_delay.is_zero() {
            return Err("first check delay must be greater than zero".into());
        }
        if self.first_delay >= self.second_delay {
            return Err(format!(
                "first check delay ({}s) must be shorter than second check delay ({}s)",
                self.first_delay.as_secs(),
                self.second_delay.as_secs()
            ));
        }
        if self.period.is_zero() {
            return Err("check period must be greater than zero".into());
        }
        for (name, value) in [
            ("second check delay", self.second_delay),
            ("check period", self.period),
        ] {
            if value > Self::MAX_DELAY {
                return Err(format!(
                    "{} ({}s) exceeds the maximum of {}s",
                    name,
                    value.as_secs(),
                    Self::MAX_DELAY.as_secs()
                ));
            }
        }
        Ok(())
    }
}

/// Schedule described by a raw `[schedule]` section: the mode's constants
/// with any explicit overrides applied
pub(crate) fn effective_schedule(raw: &RawSchedule) -> CheckSchedule {
    let mode = raw
        .mode
        .as_deref()
        .and_then(|m| parse_mode(m).ok())
        .unwrap_or_default();
    let base = CheckSchedule::for_mode(mode);

    CheckSchedule {
        first_delay: raw
            .first_check_delay_seconds
            .map(Duration::from_secs)
            .unwrap_or(base.first_delay),
        second_delay: raw
            .second_check_delay_seconds
            .map(Duration::from_secs)
            .unwrap_or(base.second_delay),
        period: raw
            .check_period_seconds
            .map(Duration::from_secs)
            .unwrap_or(base.period),
    }
}

/// Whether a variant needs a license, and under which product code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Licensing {
    Free,
    Required(ProductCode),
}

/// A packaging/licensing tier of the plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductVariant {
    id: VariantId,
    plugin_id: PluginId,
    licensing: Licensing,
}

impl ProductVariant {
    pub const NOT_FOUND_ID: &'static str = "not_found";

    pub fn new(id: impl Into<String>, plugin_id: impl Into<String>, licensing: Licensing) -> Self {
        Self {
            id: VariantId::new(id),
            plugin_id: PluginId::new(plugin_id),
            licensing,
        }
    }

    pub fn free(id: impl Into<String>, plugin_id: impl Into<String>) -> Self {
        Self::new(id, plugin_id, Licensing::Free)
    }

    pub fn licensed(
        id: impl Into<String>,
        plugin_id: impl Into<String>,
        product_code: impl Into<String>,
    ) -> Self {
        Self::new(id, plugin_id, Licensing::Required(ProductCode::new(product_code)))
    }

    /// Sentinel for "no known variant is installed". Never requires a license.
    pub fn not_found() -> Self {
        Self::free(Self::NOT_FOUND_ID, "")
    }

    fn from_raw(raw: RawVariant) -> Self {
        match (raw.requires_license, raw.product_code) {
            (true, Some(code)) => Self::licensed(raw.id, raw.plugin_id, code),
            _ => Self::free(raw.id, raw.plugin_id),
        }
    }

    pub fn id(&self) -> &VariantId {
        &self.id
    }

    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    pub fn licensing(&self) -> &Licensing {
        &self.licensing
    }

    pub fn requires_license(&self) -> bool {
        matches!(self.licensing, Licensing::Required(_))
    }

    /// Product code for the oracle; `None` for variants without a license
    pub fn product_code(&self) -> Option<&ProductCode> {
        match &self.licensing {
            Licensing::Required(code) => Some(code),
            Licensing::Free => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.id.as_str() == Self::NOT_FOUND_ID && self.plugin_id.as_str().is_empty()
    }
}

impl fmt::Display for ProductVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.licensing {
            Licensing::Required(code) => write!(
                f,
                "{} (plugin {}, requires license {})",
                self.id, self.plugin_id, code
            ),
            Licensing::Free if self.is_not_found() => write!(f, "{}", self.id),
            Licensing::Free => write!(f, "{} (plugin {}, free)", self.id, self.plugin_id),
        }
    }
}

/// Variants shipped with the plugin, in lookup order
pub fn builtin_variants() -> Vec<ProductVariant> {
    vec![
        ProductVariant::licensed("subscription", "icons-pack", "PICONSPACK"),
        ProductVariant::licensed("lifetime", "icons-pack-lifetime", "PICONSPACKLIFE"),
        ProductVariant::free("free", "icons-pack-free"),
    ]
}

/// License prompt settings
#[derive(Debug, Clone)]
pub struct PromptSettings {
    pub message: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            message: DEFAULT_PROMPT_MESSAGE.to_string(),
        }
    }
}

/// Static description of the host's plugin registry
#[derive(Debug, Clone, Default)]
pub struct HostSettings {
    pub owning_plugin: Option<PluginId>,
    pub registered_plugins: Vec<PluginId>,
}

impl HostSettings {
    fn from_raw(raw: RawHost) -> Self {
        Self {
            owning_plugin: raw.owning_plugin.map(PluginId::new),
            registered_plugins: raw
                .registered_plugins
                .into_iter()
                .map(PluginId::new)
                .collect(),
        }
    }
}

/// Oracle backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleSettings {
    Static { result: CheckResult },
    Http { url: String, timeout: Duration },
}

impl OracleSettings {
    fn from_raw(raw: RawOracle) -> Self {
        match raw {
            RawOracle::Static { result } => Self::Static {
                result: parse_check_result(&result).unwrap_or(CheckResult::Unknown),
            },
            RawOracle::Http {
                url,
                timeout_seconds,
            } => Self::Http {
                url,
                timeout: Duration::from_secs(timeout_seconds),
            },
        }
    }
}

impl Default for OracleSettings {
    /// An oracle that never decides: the checker keeps the user licensed
    fn default() -> Self {
        Self::Static {
            result: CheckResult::Unknown,
        }
    }
}
