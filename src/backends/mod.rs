//! Provider and collaborator implementations.

pub mod azure;

#[cfg(feature = "kubernetes")]
pub mod kubernetes;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "azure")]
use crate::factory::ProviderRegistry;

/// Registers every provider that can be built without extra wiring.
///
/// Adds the Azure Key Vault provider backed by the official SDK. Hosts that
/// need a custom connector, or build without the `azure` feature, call
/// [`azure::register`] instead.
#[cfg(feature = "azure")]
pub fn register_all(registry: &mut ProviderRegistry) {
    registry.register(std::sync::Arc::new(azure::AzureProvider::default()));
}
