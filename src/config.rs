//! Store configuration for the Azure Key Vault provider.
//!
//! Mirrors the `azurekv` provider block of a `SecretStore` or
//! `ClusterSecretStore` and deserializes from its camelCase JSON form.

use serde::{Deserialize, Serialize};

/// How the provider authenticates against the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthType {
    /// Client ID and secret read from a Kubernetes Secret
    ServicePrincipal,
    /// Identity assigned to the node or pod by Azure
    ManagedIdentity,
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServicePrincipal => write!(f, "ServicePrincipal"),
            Self::ManagedIdentity => write!(f, "ManagedIdentity"),
        }
    }
}

/// Whether the store is namespaced or cluster-wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    /// `SecretStore`: selectors resolve in the store's namespace
    #[default]
    SecretStore,
    /// `ClusterSecretStore`: selectors may name their own namespace
    ClusterSecretStore,
}

/// Points at one key of a Kubernetes Secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,

    /// Key inside the secret's data
    pub key: String,

    /// Namespace, honored for cluster-scoped stores only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SecretKeySelector {
    /// Creates a selector for `key` in secret `name`.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            namespace: None,
        }
    }

    /// Sets the namespace of the secret.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Service-principal credential locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSecretRef {
    /// Application (client) ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<SecretKeySelector>,

    /// Client secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<SecretKeySelector>,
}

/// Configuration for one Azure Key Vault store.
///
/// Use the builder methods for ergonomic configuration:
///
/// ```
/// use azkv_provider::{AuthType, SecretKeySelector, StoreConfig};
///
/// let config = StoreConfig::new("https://myvault.vault.azure.net")
///     .with_auth_type(AuthType::ServicePrincipal)
///     .with_tenant_id("00000000-0000-0000-0000-000000000000")
///     .with_client_id_ref(SecretKeySelector::new("azure-creds", "client-id"))
///     .with_client_secret_ref(SecretKeySelector::new("azure-creds", "client-secret"))
///     .with_namespace("apps");
///
/// assert_eq!(config.auth_type, Some(AuthType::ServicePrincipal));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Vault URL, e.g. `https://myvault.vault.azure.net`
    pub vault_url: String,

    /// Authentication mode; unset means no strategy applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,

    /// User-assigned managed identity client ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,

    /// Azure AD tenant for service-principal auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Where service-principal credentials live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_secret_ref: Option<AuthSecretRef>,

    /// Kind of the store object carrying this configuration
    #[serde(default)]
    pub store_kind: StoreKind,

    /// Namespace of the store object (empty for cluster stores)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl StoreConfig {
    /// Creates a configuration for the vault at `vault_url` with no auth type.
    pub fn new(vault_url: impl Into<String>) -> Self {
        Self {
            vault_url: vault_url.into(),
            ..Default::default()
        }
    }

    /// Sets the authentication mode.
    pub fn with_auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = Some(auth_type);
        self
    }

    /// Sets the user-assigned managed identity client ID.
    pub fn with_identity_id(mut self, identity_id: impl Into<String>) -> Self {
        self.identity_id = Some(identity_id.into());
        self
    }

    /// Sets the Azure AD tenant.
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets where the client ID is read from.
    pub fn with_client_id_ref(mut self, selector: SecretKeySelector) -> Self {
        self.auth_secret_ref
            .get_or_insert_with(AuthSecretRef::default)
            .client_id = Some(selector);
        self
    }

    /// Sets where the client secret is read from.
    pub fn with_client_secret_ref(mut self, selector: SecretKeySelector) -> Self {
        self.auth_secret_ref
            .get_or_insert_with(AuthSecretRef::default)
            .client_secret = Some(selector);
        self
    }

    /// Marks the store as a `ClusterSecretStore`.
    pub fn cluster_scoped(mut self) -> Self {
        self.store_kind = StoreKind::ClusterSecretStore;
        self
    }

    /// Sets the namespace of the store object.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Returns true for `ClusterSecretStore` configurations.
    pub fn is_cluster_scoped(&self) -> bool {
        self.store_kind == StoreKind::ClusterSecretStore
    }
}
