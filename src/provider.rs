//! Provider traits consumed by the reconciliation loop.
//!
//! A [`Provider`] turns a store configuration into a [`SecretsClient`].
//! The reconciliation loop then calls the client once per managed secret.

use crate::kubernetes::KubeClient;
use crate::{FindRef, RemoteRef, Result, StoreConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Read access to one configured store.
///
/// All implementations must be `Send + Sync` so a client can be shared
/// across reconciliation tasks.
///
/// # Example
///
/// ```no_run
/// use azkv_provider::{RemoteRef, SecretsClient};
///
/// async fn sync(client: &dyn SecretsClient) -> azkv_provider::Result<()> {
///     let password = client.get_secret(&RemoteRef::new("db-pass")).await?;
///     let creds = client.get_secret_map(&RemoteRef::new("db-creds")).await?;
///     println!("{} bytes, {} keys", password.len(), creds.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Returns the value of one object.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::EmptyName`](crate::ProviderError::EmptyName):
    ///   the key has a type prefix but no name
    /// - [`ProviderError::UnknownObjectType`](crate::ProviderError::UnknownObjectType):
    ///   the type prefix is not recognized
    /// - [`ProviderError::PropertyNotFound`](crate::ProviderError::PropertyNotFound):
    ///   a property was requested and the value does not contain it
    async fn get_secret(&self, reference: &RemoteRef) -> Result<Vec<u8>>;

    /// Returns one object's JSON value split into its top-level keys.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotSupported`](crate::ProviderError::NotSupported):
    ///   the object kind cannot yield a map
    /// - [`ProviderError::Json`](crate::ProviderError::Json):
    ///   the value is not a flat string-to-string JSON object
    async fn get_secret_map(&self, reference: &RemoteRef) -> Result<HashMap<String, Vec<u8>>>;

    /// Returns every secret that passes `find`, keyed by secret name.
    ///
    /// Fails as a whole if any page or any item fetch fails.
    async fn get_all_secrets(&self, find: &FindRef) -> Result<HashMap<String, Vec<u8>>>;

    /// Releases resources held by the client.
    async fn close(&self) -> Result<()>;
}

/// A backend that can build [`SecretsClient`]s.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name the provider is registered under (e.g., "azurekv").
    fn name(&self) -> &str;

    /// Checks a store configuration without contacting any service.
    fn validate_store(&self, store: &StoreConfig) -> Result<()>;

    /// Builds an authorized client for `store`.
    ///
    /// `namespace` is the namespace of the object being reconciled and is the
    /// last fallback for resolving credential secrets.
    async fn new_client(
        &self,
        store: &StoreConfig,
        kube: Arc<dyn KubeClient>,
        namespace: &str,
    ) -> Result<Box<dyn SecretsClient>>;
}
