//! Plugin-based provider registry
//!
//! The registry maps the `provider` selector from the configuration to a
//! factory, avoiding hardcoded if-else chains in the daemon.
//!
//! ## Registration
//!
//! Provider crates expose a `register` function:
//!
//! ```rust,ignore
//! // In dns-updater-cloudflare
//! pub fn register(registry: &mut ProviderRegistry) {
//!     registry.register_provider("cloudflare", Box::new(CloudflareFactory));
//! }
//! ```
//!
//! The daemon registers every compiled-in provider, then builds one updater
//! per record with [`ProviderRegistry::create_provider`].

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsUpdater, DnsUpdaterFactory};
use std::collections::HashMap;

/// Provider registry for configuration-driven DNS updater creation
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS updater factories
    providers: HashMap<String, Box<dyn DnsUpdaterFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS updater factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use dns_updater_core::registry::ProviderRegistry;
    /// # use dns_updater_core::traits::DnsUpdaterFactory;
    /// # struct MyFactory;
    /// # impl DnsUpdaterFactory for MyFactory {
    /// #     fn create(&self, _config: &dns_updater_core::ProviderConfig) -> dns_updater_core::Result<Box<dyn dns_updater_core::DnsUpdater>> { unimplemented!() }
    /// # }
    /// let mut registry = ProviderRegistry::new();
    /// registry.register_provider("myprovider", Box::new(MyFactory));
    /// assert!(registry.has_provider("myprovider"));
    /// ```
    pub fn register_provider(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn DnsUpdaterFactory>,
    ) {
        self.providers.insert(name.into(), factory);
    }

    /// Create a DNS updater from configuration
    ///
    /// # Errors
    ///
    /// - `Error::Config` if no factory is registered for the selector
    /// - whatever the factory reports (typically missing credentials)
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsUpdater>> {
        let provider_type = config.type_name();

        let factory = self.providers.get(provider_type).ok_or_else(|| {
            Error::config(format!(
                "Unsupported DNS provider: {} (registered: {})",
                provider_type,
                self.list_providers().join(", ")
            ))
        })?;

        factory.create(config)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}
