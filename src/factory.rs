//! Provider registry.
//!
//! The host process builds a [`ProviderRegistry`], registers the providers it
//! wants, and looks them up by name when a store references one.

use crate::kubernetes::KubeClient;
use crate::{Provider, ProviderError, Result, SecretsClient, StoreConfig};
use std::collections::HashMap;
use std::sync::Arc;

/// Providers keyed by name.
///
/// # Example
///
/// ```
/// use azkv_provider::backends::azure::AzureProvider;
/// use azkv_provider::backends::mock::MockConnector;
/// use azkv_provider::factory::ProviderRegistry;
/// use std::sync::Arc;
///
/// let mut registry = ProviderRegistry::new();
/// registry.register(Arc::new(AzureProvider::new(Arc::new(MockConnector::new()))));
///
/// assert!(registry.get("azurekv").is_some());
/// ```
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> &mut Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// Looks up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Names of all registered providers, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds a client from the provider registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if no provider has that name, or
    /// whatever the provider's `new_client` returns.
    pub async fn new_client(
        &self,
        name: &str,
        store: &StoreConfig,
        kube: Arc<dyn KubeClient>,
        namespace: &str,
    ) -> Result<Box<dyn SecretsClient>> {
        let provider = self.get(name).ok_or_else(|| {
            ProviderError::Config(format!(
                "unknown provider: {} (registered: {})",
                name,
                self.names().join(", ")
            ))
        })?;

        provider.new_client(store, kube, namespace).await
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::azure::AzureProvider;
    use crate::backends::mock::{MockConnector, MockKube};
    use crate::AuthType;

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(AzureProvider::new(Arc::new(MockConnector::new()))));
        registry
    }

    #[test]
    fn test_provider_registration() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["azurekv"]);
        assert!(registry.get("vault").is_none());
    }

    #[tokio::test]
    async fn test_unknown_provider_error() {
        let store = StoreConfig::new("https://kv.vault.azure.net")
            .with_auth_type(AuthType::ManagedIdentity);

        let result = registry()
            .new_client("gcpsm", &store, Arc::new(MockKube::new()), "default")
            .await;

        match result {
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains("unknown provider: gcpsm"));
                assert!(msg.contains("azurekv"));
            }
            Ok(_) => panic!("expected an error for an unregistered provider"),
        }
    }

    #[tokio::test]
    async fn test_new_client_by_name() {
        let store = StoreConfig::new("https://kv.vault.azure.net")
            .with_auth_type(AuthType::ManagedIdentity);

        let client = registry()
            .new_client("azurekv", &store, Arc::new(MockKube::new()), "default")
            .await;
        assert!(client.is_ok());
    }
}
