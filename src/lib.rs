//! azkv-provider - Azure Key Vault backend for Kubernetes secret synchronization.
//!
//! The crate plugs into a secret-synchronization operator as one "provider".
//! Given a store configuration it authenticates against an Azure Key Vault and
//! hands back a [`SecretsClient`] that the reconciliation loop calls once per
//! managed secret.
//!
//! # Features
//!
//! - **Two auth paths**: managed identity, or a service principal whose client
//!   ID and secret live in Kubernetes Secrets
//! - **Typed references**: `cert/<name>` and `key/<name>` keys are parsed into
//!   [`ObjectRef`] once, bare names address secrets
//! - **JSON helpers**: property selection and flat JSON objects as key maps
//! - **Filtered listing**: bulk reads by name regex and tags
//! - **Testable seams**: vault, Kubernetes and credential exchange sit behind
//!   traits with in-memory mocks
//!
//! # Quick Start
//!
//! ```no_run
//! use azkv_provider::factory::ProviderRegistry;
//! use azkv_provider::{backends, AuthType, RemoteRef, StoreConfig};
//! # use azkv_provider::KubeClient;
//! # use std::sync::Arc;
//!
//! # #[cfg(feature = "azure")]
//! # async fn run(kube: Arc<dyn KubeClient>) -> azkv_provider::Result<()> {
//! let mut registry = ProviderRegistry::new();
//! backends::register_all(&mut registry);
//!
//! let store = StoreConfig::new("https://myvault.vault.azure.net")
//!     .with_auth_type(AuthType::ManagedIdentity);
//!
//! let client = registry.new_client("azurekv", &store, kube, "default").await?;
//! let password = client.get_secret(&RemoteRef::new("db-pass")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `mock` | yes | In-memory vault, cluster and connector |
//! | `azure` | no | Azure SDK connector and `backends::register_all` |
//! | `kubernetes` | no | `kube`-backed [`KubeClient`] |
//! | `full` | no | All of the above |

pub mod auth;
pub mod backends;
pub mod config;
pub mod error;
pub mod factory;
pub mod kubernetes;
pub mod property;
pub mod provider;
pub mod reference;
pub mod validation;
pub mod vault;

pub use auth::Authorizer;
pub use config::{AuthSecretRef, AuthType, SecretKeySelector, StoreConfig, StoreKind};
pub use error::{ProviderError, Result};
pub use kubernetes::KubeClient;
pub use provider::{Provider, SecretsClient};
pub use reference::{FindRef, NameFilter, ObjectKind, ObjectRef, RemoteRef};
pub use vault::{VaultClient, VaultConnector};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::{MockConnector, MockKube};
    use crate::factory::ProviderRegistry;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_registry_roundtrip() {
        let connector = Arc::new(MockConnector::new());
        connector.vault().set_secret("api-key", "sk-123").await;

        let mut registry = ProviderRegistry::new();
        backends::azure::register(&mut registry, connector);

        let store = StoreConfig::new("https://kv.vault.azure.net")
            .with_auth_type(AuthType::ManagedIdentity);
        let client = registry
            .new_client("azurekv", &store, Arc::new(MockKube::new()), "default")
            .await
            .unwrap();

        let value = client.get_secret(&RemoteRef::new("api-key")).await.unwrap();
        assert_eq!(value, b"sk-123");
        client.close().await.unwrap();
    }
}
