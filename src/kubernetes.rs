//! Kubernetes access used to read service-principal credentials.

use crate::{ProviderError, Result, SecretKeySelector, StoreConfig};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Reads Secret objects from the cluster.
///
/// The provider only ever needs the data map of a named Secret, so that is
/// all this trait exposes. See [`KubeApiClient`](crate::backends::kubernetes::KubeApiClient)
/// for the `kube` implementation.
#[async_trait]
pub trait KubeClient: Send + Sync {
    /// Returns the decoded `data` map of Secret `name` in `namespace`.
    ///
    /// A Secret without data yields an empty map. Any lookup failure, including
    /// a missing Secret, is returned as an error.
    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<BTreeMap<String, Vec<u8>>>;
}

/// Picks the namespace a selector resolves in.
///
/// Cluster-scoped stores may point anywhere via the selector's own namespace.
/// Otherwise the store's namespace wins, then the caller's.
pub fn selector_namespace<'a>(
    store: &'a StoreConfig,
    selector: &'a SecretKeySelector,
    fallback: &'a str,
) -> &'a str {
    if store.is_cluster_scoped() {
        if let Some(ns) = selector.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            return ns;
        }
    }

    store
        .namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .unwrap_or(fallback)
}

/// Reads the value a selector points at, trimmed of surrounding whitespace.
///
/// # Errors
///
/// - [`ProviderError::KubeSecretNotFound`]: the Secret could not be fetched
/// - [`ProviderError::KubeKeyMissing`]: the Secret has no such key
/// - [`ProviderError::InvalidData`]: the value is not UTF-8
pub async fn resolve_selector(
    kube: &dyn KubeClient,
    store: &StoreConfig,
    selector: &SecretKeySelector,
    namespace: &str,
) -> Result<String> {
    let ns = selector_namespace(store, selector, namespace);

    let data = kube
        .get_secret_data(ns, &selector.name)
        .await
        .map_err(|source| ProviderError::KubeSecretNotFound {
            namespace: ns.to_string(),
            name: selector.name.clone(),
            source,
        })?;

    let bytes = data
        .get(&selector.key)
        .ok_or_else(|| ProviderError::KubeKeyMissing {
            key: selector.key.clone(),
            name: selector.name.clone(),
            namespace: ns.to_string(),
        })?;

    let value = std::str::from_utf8(bytes).map_err(|_| {
        ProviderError::InvalidData(format!(
            "key {:?} in secret '{}/{}' is not valid UTF-8",
            selector.key, selector.name, ns
        ))
    })?;

    tracing::debug!(
        secret = %selector.name,
        namespace = %ns,
        key = %selector.key,
        "Resolved credential from Kubernetes Secret"
    );

    Ok(value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockKube;

    #[test]
    fn test_selector_namespace_rules() {
        let selector = SecretKeySelector::new("creds", "id").in_namespace("ops");

        let namespaced = StoreConfig::new("https://kv").with_namespace("apps");
        assert_eq!(selector_namespace(&namespaced, &selector, "caller"), "apps");

        let cluster = StoreConfig::new("https://kv").cluster_scoped();
        assert_eq!(selector_namespace(&cluster, &selector, "caller"), "ops");

        let plain = SecretKeySelector::new("creds", "id");
        assert_eq!(selector_namespace(&cluster, &plain, "caller"), "caller");
    }

    #[tokio::test]
    async fn test_resolve_trims_value() {
        let kube = MockKube::new();
        kube.set_secret("apps", "creds", [("id", "  client-123\n")]).await;

        let store = StoreConfig::new("https://kv").with_namespace("apps");
        let value = resolve_selector(&kube, &store, &SecretKeySelector::new("creds", "id"), "apps")
            .await
            .unwrap();

        assert_eq!(value, "client-123");
    }

    #[tokio::test]
    async fn test_resolve_missing_secret_and_key() {
        let kube = MockKube::new();
        kube.set_secret("apps", "creds", [("id", "x")]).await;
        let store = StoreConfig::new("https://kv").with_namespace("apps");

        let err = resolve_selector(&kube, &store, &SecretKeySelector::new("other", "id"), "apps")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::KubeSecretNotFound { .. }));
        assert!(err.to_string().contains("apps/other"));

        let selector = SecretKeySelector::new("creds", "secret");
        let err = resolve_selector(&kube, &store, &selector, "apps").await.unwrap_err();
        assert!(matches!(err, ProviderError::KubeKeyMissing { ref key, .. } if key == "secret"));
    }
}
