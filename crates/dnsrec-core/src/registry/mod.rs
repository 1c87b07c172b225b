//! Plugin-based provider registry
//!
//! The registry allows record providers to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsrec_core::registry::ProviderRegistry;
//! use dnsrec_core::config::AdapterConfig;
//!
//! // Create a registry
//! let registry = ProviderRegistry::new();
//!
//! // Register providers
//! dnsrec_route53::register(&registry, route53_factory);
//!
//! // Create provider from config
//! let config = AdapterConfig::from_env()?;
//! let provider = registry.create_provider(&config)?;
//! ```

use crate::config::AdapterConfig;
use crate::error::{Error, Result};
use crate::traits::{RecordProvider, RecordProviderFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Provider registry for plugin-based record provider creation
///
/// The registry maintains a map of provider type names to factory objects,
/// allowing dynamic instantiation of providers based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered record provider factories
    providers: RwLock<HashMap<String, Box<dyn RecordProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record provider factory
    ///
    /// Registering a name twice replaces the earlier factory.
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "route53")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn RecordProviderFactory>,
    ) {
        let name = name.into();
        tracing::debug!(provider = %name, "registering record provider");
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name, factory);
    }

    /// Create a record provider from configuration
    ///
    /// The configuration is validated first; the factory is selected by
    /// [`ProviderConfig::type_name`](crate::config::ProviderConfig::type_name).
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RecordProvider>)`: Created provider instance
    /// - `Err(Error)`: If the config is invalid, the provider type is not
    ///   registered, or creation fails
    pub fn create_provider(&self, config: &AdapterConfig) -> Result<Box<dyn RecordProvider>> {
        config.validate()?;

        let provider_type = config.provider.type_name();
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    ///
    /// # Returns
    ///
    /// A vector of registered provider type names
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name
    ///
    /// # Returns
    ///
    /// `true` if registered, `false` otherwise
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    struct MockProviderFactory;

    impl RecordProviderFactory for MockProviderFactory {
        fn create(&self, _config: &AdapterConfig) -> Result<Box<dyn RecordProvider>> {
            Err(Error::provider("mock", "Mock provider not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ProviderRegistry::new();

        // Initially empty
        assert!(!registry.has_provider("mock"));

        // Register
        registry.register_provider("mock", Box::new(MockProviderFactory));

        // Now present
        assert!(registry.has_provider("mock"));
        assert!(registry.list_providers().contains(&"mock".to_string()));
    }

    #[test]
    fn unknown_provider_type_is_a_config_error() {
        let registry = ProviderRegistry::new();
        let result = registry.create_provider(&AdapterConfig::new());
        assert!(matches!(result, Err(Error::Config(ref msg)) if msg.contains("route53")));
    }

    #[test]
    fn custom_config_selects_factory_by_name() {
        let registry = ProviderRegistry::new();
        registry.register_provider("mock", Box::new(MockProviderFactory));

        let config = AdapterConfig {
            provider: ProviderConfig::Custom {
                factory: "mock".to_string(),
                config: serde_json::json!({}),
            },
            ..AdapterConfig::default()
        };

        let result = registry.create_provider(&config);
        assert!(matches!(result, Err(Error::Provider { ref provider, .. }) if provider == "mock"));
    }

    #[test]
    fn invalid_config_is_rejected_before_lookup() {
        let registry = ProviderRegistry::new();
        registry.register_provider("mock", Box::new(MockProviderFactory));

        let config = AdapterConfig {
            provider: ProviderConfig::Custom {
                factory: "mock".to_string(),
                config: serde_json::Value::Null,
            },
            ..AdapterConfig::default()
        };

        assert!(matches!(
            registry.create_provider(&config),
            Err(Error::Config(_))
        ));
    }
}
