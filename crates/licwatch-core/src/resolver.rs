//! Installed variant lookup

use licwatch_config::ProductVariant;
use licwatch_host_api::PluginRegistry;
use licwatch_util::PluginId;
use std::collections::HashSet;
use tracing::{info, warn};

/// Maps the host's plugin registry to one of the known variants.
///
/// Absence is not an error: when nothing matches the resolver returns
/// [`ProductVariant::not_found`].
pub struct VariantResolver<'a> {
    registry: &'a dyn PluginRegistry,
    known: &'a [ProductVariant],
}

impl<'a> VariantResolver<'a> {
    /// `known` is the ordered list of findable variants; the first match wins.
    pub fn new(registry: &'a dyn PluginRegistry, known: &'a [ProductVariant]) -> Self {
        Self { registry, known }
    }

    pub fn resolve(&self) -> ProductVariant {
        let found = match self.registry.owning_plugin() {
            Some(owner) => {
                info!(plugin_id = %owner, "Found installed plugin by direct lookup");
                self.find(|id| id == &owner)
            }
            None => {
                warn!("Direct plugin lookup failed, scanning all registered plugins");
                let registered: HashSet<PluginId> =
                    self.registry.registered_ids().into_iter().collect();
                self.find(|id| registered.contains(id))
            }
        };

        found.unwrap_or_else(ProductVariant::not_found)
    }

    fn find(&self, matches: impl Fn(&PluginId) -> bool) -> Option<ProductVariant> {
        self.known
            .iter()
            .filter(|v| !v.is_not_found())
            .find(|v| matches(v.plugin_id()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use licwatch_config::builtin_variants;
    use licwatch_host_api::MockRegistry;

    fn known() -> Vec<ProductVariant> {
        vec![
            ProductVariant::licensed("subscription", "com.example.paid", "PPAID"),
            ProductVariant::licensed("lifetime", "com.example.lifetime", "PLIFE"),
            ProductVariant::free("free", "com.example.free"),
        ]
    }

    #[test]
    fn direct_lookup_wins() {
        let registry = MockRegistry::new()
            .with_owning_plugin("com.example.lifetime")
            .with_registered(["com.example.paid"]);
        let known = known();

        let variant = VariantResolver::new(&registry, &known).resolve();
        assert_eq!(variant.id().as_str(), "lifetime");
    }

    #[test]
    fn direct_lookup_of_unknown_plugin_is_not_found() {
        let registry = MockRegistry::new()
            .with_owning_plugin("com.example.somebody-else")
            .with_registered(["com.example.paid"]);
        let known = known();

        let variant = VariantResolver::new(&registry, &known).resolve();
        assert!(variant.is_not_found());
        assert!(!variant.requires_license());
    }

    #[test]
    fn fallback_scan_returns_first_known_match() {
        // Registration order is irrelevant; the known list's order decides.
        let registry = MockRegistry::new().with_registered([
            "org.other.tool",
            "com.example.free",
            "com.example.lifetime",
        ]);
        let known = known();

        let variant = VariantResolver::new(&registry, &known).resolve();
        assert_eq!(variant.id().as_str(), "lifetime");
    }

    #[test]
    fn fallback_scan_without_match_is_not_found() {
        let registry = MockRegistry::new().with_registered(["org.other.tool"]);
        let known = known();

        let variant = VariantResolver::new(&registry, &known).resolve();
        assert!(variant.is_not_found());
    }

    #[test]
    fn empty_registry_is_not_found() {
        let registry = MockRegistry::new();
        let known = builtin_variants();

        assert!(VariantResolver::new(&registry, &known).resolve().is_not_found());
    }

    #[test]
    fn sentinel_in_known_list_never_matches() {
        let registry = MockRegistry::new().with_owning_plugin("");
        let known = vec![ProductVariant::not_found(), ProductVariant::free("free", "x")];

        let variant = VariantResolver::new(&registry, &known).resolve();
        assert!(variant.is_not_found());
    }
}
