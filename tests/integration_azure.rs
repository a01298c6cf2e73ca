//! Azure Key Vault integration tests against a real vault and cluster.
//!
//! These tests require:
//! - `AZKV_TEST_VAULT_URL` pointing at a vault the caller can read
//! - a kubeconfig (or in-cluster config) for the Kubernetes client
//! - a secret named `azkv-test` in that vault
//!
//! Run with:
//!   AZKV_TEST_VAULT_URL=https://myvault.vault.azure.net \
//!     cargo test --test integration_azure --features full -- --ignored

#![cfg(all(feature = "azure", feature = "kubernetes"))]

use azkv_provider::backends::azure::AzureProvider;
use azkv_provider::backends::kubernetes::KubeApiClient;
use azkv_provider::{AuthType, FindRef, Provider, RemoteRef, SecretsClient, StoreConfig};
use std::sync::Arc;

async fn setup_client() -> Box<dyn SecretsClient> {
    let vault_url =
        std::env::var("AZKV_TEST_VAULT_URL").expect("AZKV_TEST_VAULT_URL must be set");

    let store = StoreConfig::new(vault_url).with_auth_type(AuthType::ManagedIdentity);
    let kube = KubeApiClient::try_default()
        .await
        .expect("Failed to create Kubernetes client");

    AzureProvider::default()
        .new_client(&store, Arc::new(kube), "default")
        .await
        .expect("Failed to create Azure client")
}

#[tokio::test]
#[ignore] // Run only when a vault is available
async fn test_azure_get_secret() {
    let client = setup_client().await;

    let value = client
        .get_secret(&RemoteRef::new("azkv-test"))
        .await
        .expect("Failed to get secret");
    assert!(!value.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_azure_list_by_name() {
    let client = setup_client().await;

    let secrets = client
        .get_all_secrets(&FindRef::new().with_name_regexp("^azkv-test$"))
        .await
        .expect("Failed to list secrets");
    assert!(secrets.contains_key("azkv-test"));
}
