//! Host collaborators for running the checker standalone

use licwatch_config::HostSettings;
use licwatch_host_api::{LicensePrompt, PluginRegistry};
use licwatch_util::{PluginId, ProductCode};
use tracing::warn;

/// Plugin registry described by the `[host]` config section
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    owning: Option<PluginId>,
    registered: Vec<PluginId>,
}

impl StaticRegistry {
    pub fn from_settings(settings: &HostSettings) -> Self {
        Self {
            owning: settings.owning_plugin.clone(),
            registered: settings.registered_plugins.clone(),
        }
    }
}

impl PluginRegistry for StaticRegistry {
    fn owning_plugin(&self) -> Option<PluginId> {
        self.owning.clone()
    }

    fn registered_ids(&self) -> Vec<PluginId> {
        self.registered.clone()
    }
}

/// Prompt that has no UI to show and writes the request to the log instead
#[derive(Debug, Default)]
pub struct LogPrompt;

impl LicensePrompt for LogPrompt {
    fn request_license(&self, product_code: &ProductCode, message: &str) {
        warn!(product_code = %product_code, message, "License activation requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_mirrors_settings() {
        let settings = HostSettings {
            owning_plugin: None,
            registered_plugins: vec![PluginId::new("a"), PluginId::new("b")],
        };
        let registry = StaticRegistry::from_settings(&settings);

        assert!(registry.owning_plugin().is_none());
        assert_eq!(registry.registered_ids().len(), 2);
    }
}
