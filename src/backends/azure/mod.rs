//! Azure Key Vault provider.
//!
//! Reads secrets, keys and certificates from an Azure Key Vault for the
//! secret-synchronization operator.
//!
//! # Authentication
//!
//! The store's `authType` picks exactly one path:
//! - `ManagedIdentity`: the identity Azure assigns to the node or pod,
//!   optionally a user-assigned one selected by `identityId` (the SDK
//!   connector only supports the system-assigned identity)
//! - `ServicePrincipal`: `tenantId` plus a client ID and secret read once from
//!   Kubernetes Secrets referenced by `authSecretRef`
//!
//! A configured path that fails returns its error; it never falls back to
//! the other one.
//!
//! # Reference keys
//!
//! - `db-pass` or `secret/db-pass`: secret value
//! - `cert/tls`: certificate as DER bytes
//! - `key/signing`: key as a JSON web key
//!
//! # Example
//!
//! ```
//! use azkv_provider::backends::azure::AzureProvider;
//! use azkv_provider::backends::mock::{MockConnector, MockKube};
//! use azkv_provider::{AuthType, Provider, RemoteRef, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> azkv_provider::Result<()> {
//!     let connector = Arc::new(MockConnector::new());
//!     connector.vault().set_secret("db-pass", "hunter2").await;
//!
//!     let provider = AzureProvider::new(connector);
//!     let store = StoreConfig::new("https://myvault.vault.azure.net")
//!         .with_auth_type(AuthType::ManagedIdentity);
//!
//!     let client = provider.new_client(&store, Arc::new(MockKube::new()), "default").await?;
//!     assert_eq!(client.get_secret(&RemoteRef::new("db-pass")).await?, b"hunter2");
//!     Ok(())
//! }
//! ```

mod backend;
#[cfg(feature = "azure")]
mod sdk;

pub use backend::AzureKeyVault;
#[cfg(feature = "azure")]
pub use sdk::{AzureSdkClient, AzureSdkConnector};

use crate::auth::{authorize, default_strategies, AuthStrategy};
use crate::factory::ProviderRegistry;
use crate::kubernetes::KubeClient;
use crate::validation::{validate_store, validate_vault_url};
use crate::vault::VaultConnector;
use crate::{Provider, Result, SecretsClient, StoreConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Name the provider registers under.
pub const PROVIDER_NAME: &str = "azurekv";

/// Builds [`AzureKeyVault`] clients from store configurations.
pub struct AzureProvider {
    connector: Arc<dyn VaultConnector>,
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl AzureProvider {
    /// Creates a provider that connects through `connector` and tries
    /// managed identity, then service principal.
    pub fn new(connector: Arc<dyn VaultConnector>) -> Self {
        Self {
            connector,
            strategies: default_strategies(),
        }
    }

    /// Replaces the ordered list of auth strategies.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn AuthStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }
}

#[cfg(feature = "azure")]
impl Default for AzureProvider {
    fn default() -> Self {
        Self::new(Arc::new(AzureSdkConnector))
    }
}

#[async_trait]
impl Provider for AzureProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn validate_store(&self, store: &StoreConfig) -> Result<()> {
        validate_store(store)
    }

    async fn new_client(
        &self,
        store: &StoreConfig,
        kube: Arc<dyn KubeClient>,
        namespace: &str,
    ) -> Result<Box<dyn SecretsClient>> {
        validate_vault_url(&store.vault_url)?;

        let authorizer = authorize(&self.strategies, store, kube.as_ref(), namespace).await?;
        let auth_type = authorizer.auth_type();
        let client = self.connector.connect(&store.vault_url, authorizer).await?;

        tracing::info!(
            provider = PROVIDER_NAME,
            vault = %store.vault_url,
            auth_type = %auth_type,
            "Initialized Azure Key Vault client"
        );

        Ok(Box::new(AzureKeyVault::new(client, store.vault_url.clone())))
    }
}

/// Registers an Azure provider that connects through `connector`.
pub fn register(registry: &mut ProviderRegistry, connector: Arc<dyn VaultConnector>) {
    registry.register(Arc::new(AzureProvider::new(connector)));
}
