//! Authentication strategies.
//!
//! Client construction walks [`default_strategies`] in order. The first
//! strategy whose [`AuthStrategy::claims`] returns true decides the outcome:
//! its error is returned as-is and later strategies are never tried.

use crate::kubernetes::{resolve_selector, KubeClient};
use crate::{AuthType, ProviderError, Result, StoreConfig};
use async_trait::async_trait;

/// Credential chosen for a store, handed to a [`VaultConnector`](crate::VaultConnector).
#[derive(Clone, PartialEq, Eq)]
pub enum Authorizer {
    /// Azure-assigned identity, optionally a specific user-assigned one.
    ManagedIdentity {
        /// User-assigned identity client ID
        client_id: Option<String>,
    },
    /// Application credentials.
    ServicePrincipal {
        /// Azure AD tenant
        tenant_id: String,
        /// Application (client) ID
        client_id: String,
        /// Client secret
        client_secret: String,
    },
}

impl Authorizer {
    /// Auth mode this credential belongs to.
    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::ManagedIdentity { .. } => AuthType::ManagedIdentity,
            Self::ServicePrincipal { .. } => AuthType::ServicePrincipal,
        }
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManagedIdentity { client_id } => f
                .debug_struct("ManagedIdentity")
                .field("client_id", client_id)
                .finish(),
            Self::ServicePrincipal {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ServicePrincipal")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

/// One way of obtaining an [`Authorizer`].
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &str;

    /// Whether this strategy is responsible for `store`.
    fn claims(&self, store: &StoreConfig) -> bool;

    /// Produces a credential. Only called when [`claims`](Self::claims) is true.
    async fn authorize(
        &self,
        store: &StoreConfig,
        kube: &dyn KubeClient,
        namespace: &str,
    ) -> Result<Authorizer>;
}

/// Managed identity, optionally user-assigned via `identity_id`.
pub struct ManagedIdentityStrategy;

#[async_trait]
impl AuthStrategy for ManagedIdentityStrategy {
    fn name(&self) -> &str {
        "managed-identity"
    }

    fn claims(&self, store: &StoreConfig) -> bool {
        store.auth_type == Some(AuthType::ManagedIdentity)
    }

    async fn authorize(
        &self,
        store: &StoreConfig,
        _kube: &dyn KubeClient,
        _namespace: &str,
    ) -> Result<Authorizer> {
        Ok(Authorizer::ManagedIdentity {
            client_id: store.identity_id.clone().filter(|id| !id.is_empty()),
        })
    }
}

/// Service principal with client ID and secret read from Kubernetes.
pub struct ServicePrincipalStrategy;

#[async_trait]
impl AuthStrategy for ServicePrincipalStrategy {
    fn name(&self) -> &str {
        "service-principal"
    }

    fn claims(&self, store: &StoreConfig) -> bool {
        store.auth_type == Some(AuthType::ServicePrincipal)
    }

    async fn authorize(
        &self,
        store: &StoreConfig,
        kube: &dyn KubeClient,
        namespace: &str,
    ) -> Result<Authorizer> {
        let tenant_id = store
            .tenant_id
            .clone()
            .ok_or_else(|| ProviderError::Config("missing tenantID in store config".to_string()))?;

        let refs = store.auth_secret_ref.as_ref().ok_or_else(|| {
            ProviderError::Config("missing clientID/clientSecret in store config".to_string())
        })?;

        let (Some(id_ref), Some(secret_ref)) = (&refs.client_id, &refs.client_secret) else {
            return Err(ProviderError::Config(
                "missing clientID/clientSecret in store config".to_string(),
            ));
        };

        let client_id = resolve_selector(kube, store, id_ref, namespace).await?;
        let client_secret = resolve_selector(kube, store, secret_ref, namespace).await?;

        Ok(Authorizer::ServicePrincipal {
            tenant_id,
            client_id,
            client_secret,
        })
    }
}

/// Strategies in the order they are consulted.
pub fn default_strategies() -> Vec<Box<dyn AuthStrategy>> {
    vec![
        Box::new(ManagedIdentityStrategy),
        Box::new(ServicePrincipalStrategy),
    ]
}

/// Runs the first strategy that claims `store`.
///
/// # Errors
///
/// - [`ProviderError::NoValidAuthType`]: no strategy claimed the store
/// - whatever the claiming strategy returned, unchanged
pub async fn authorize(
    strategies: &[Box<dyn AuthStrategy>],
    store: &StoreConfig,
    kube: &dyn KubeClient,
    namespace: &str,
) -> Result<Authorizer> {
    let strategy = strategies
        .iter()
        .find(|s| s.claims(store))
        .ok_or(ProviderError::NoValidAuthType)?;

    tracing::debug!(strategy = strategy.name(), "Authorizing Azure Key Vault client");
    strategy.authorize(store, kube, namespace).await
}
