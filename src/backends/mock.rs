//! In-memory collaborators for testing.
//!
//! [`MockVault`] stands in for the Key Vault SDK, [`MockKube`] for the
//! Kubernetes API and [`MockConnector`] for credential exchange. All three
//! support error injection to simulate failure conditions.

use crate::auth::Authorizer;
use crate::kubernetes::KubeClient;
use crate::reference::ObjectKind;
use crate::vault::{
    CertificateBundle, KeyBundle, SecretBundle, SecretItem, VaultClient, VaultConnector,
};
use crate::{ProviderError, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

const MOCK_VAULT_URL: &str = "https://mock.vault.azure.net";

#[derive(Debug, Clone, Default)]
struct MockSecret {
    latest: Option<String>,
    versions: HashMap<String, String>,
    enabled: bool,
    tags: HashMap<String, String>,
}

/// A request the mock vault served, for asserting on what the adapter asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRequest {
    /// Kind of object requested
    pub kind: ObjectKind,
    /// Object name
    pub name: String,
    /// Requested version, `None` for latest
    pub version: Option<String>,
}

/// In-memory vault.
///
/// # Example
///
/// ```
/// use azkv_provider::backends::mock::MockVault;
/// use azkv_provider::{ProviderError, VaultClient};
///
/// #[tokio::main]
/// async fn main() -> azkv_provider::Result<()> {
///     let mut vault = MockVault::new();
///     vault.set_secret("db-pass", "hunter2").await;
///
///     let bundle = vault.get_secret("db-pass", None).await?;
///     assert_eq!(bundle.value.as_deref(), Some("hunter2"));
///
///     // Test error conditions
///     vault.get_error = Some(ProviderError::Authorization("expired".to_string()));
///     assert!(vault.get_secret("db-pass", None).await.is_err());
///
///     Ok(())
/// }
/// ```
pub struct MockVault {
    secrets: RwLock<BTreeMap<String, MockSecret>>,
    certificates: RwLock<HashMap<String, Vec<u8>>>,
    keys: RwLock<HashMap<String, serde_json::Value>>,
    extra_items: RwLock<Vec<SecretItem>>,
    requests: RwLock<Vec<VaultRequest>>,
    page_size: usize,

    /// Error to return from `get_secret()`
    pub get_error: Option<ProviderError>,
    /// Error to return from `get_key()`
    pub key_error: Option<ProviderError>,
    /// Error to return from `get_certificate()`
    pub cert_error: Option<ProviderError>,
    /// Error to return from `list_secrets()`, after the last good page
    pub list_error: Option<ProviderError>,
    /// List items without their tags, like SDK listings that omit them
    pub omit_list_tags: bool,
}

impl MockVault {
    /// Creates an empty vault that lists two items per page.
    pub fn new() -> Self {
        Self {
            secrets: RwLock::new(BTreeMap::new()),
            certificates: RwLock::new(HashMap::new()),
            keys: RwLock::new(HashMap::new()),
            extra_items: RwLock::new(Vec::new()),
            requests: RwLock::new(Vec::new()),
            page_size: 2,
            get_error: None,
            key_error: None,
            cert_error: None,
            list_error: None,
            omit_list_tags: false,
        }
    }

    /// Sets how many items each listing page holds.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the latest value of a secret, enabling it.
    pub async fn set_secret(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut secrets = self.secrets.write().await;
        let secret = secrets.entry(name.into()).or_default();
        secret.latest = Some(value.into());
        secret.enabled = true;
    }

    /// Sets the latest value of a secret along with its tags.
    pub async fn set_secret_with_tags<'a>(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        tags: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let name = name.into();
        self.set_secret(name.clone(), value).await;

        let mut secrets = self.secrets.write().await;
        if let Some(secret) = secrets.get_mut(&name) {
            secret.tags = tags
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        }
    }

    /// Stores a specific version of a secret without changing the latest value.
    pub async fn set_secret_version(
        &self,
        name: impl Into<String>,
        version: impl Into<String>,
        value: impl Into<String>,
    ) {
        let mut secrets = self.secrets.write().await;
        let secret = secrets.entry(name.into()).or_default();
        secret.versions.insert(version.into(), value.into());
        secret.enabled = true;
    }

    /// Marks a secret as disabled.
    pub async fn disable(&self, name: &str) {
        if let Some(secret) = self.secrets.write().await.get_mut(name) {
            secret.enabled = false;
        }
    }

    /// Stores a certificate's DER bytes.
    pub async fn set_certificate(&self, name: impl Into<String>, der: Vec<u8>) {
        self.certificates.write().await.insert(name.into(), der);
    }

    /// Stores a key's JSON web key.
    pub async fn set_key(&self, name: impl Into<String>, jwk: serde_json::Value) {
        self.keys.write().await.insert(name.into(), jwk);
    }

    /// Appends a raw item to the listing, e.g. one without an identifier.
    pub async fn push_list_item(&self, item: SecretItem) {
        self.extra_items.write().await.push(item);
    }

    /// Requests served so far, in order.
    pub async fn requests(&self) -> Vec<VaultRequest> {
        self.requests.read().await.clone()
    }

    async fn record(&self, kind: ObjectKind, name: &str, version: Option<&str>) {
        self.requests.write().await.push(VaultRequest {
            kind,
            name: name.to_string(),
            version: version.map(str::to_string),
        });
    }

    fn object_id(collection: &str, name: &str) -> String {
        format!("{}/{}/{}", MOCK_VAULT_URL, collection, name)
    }

    async fn list_pages(&self) -> Vec<Result<Vec<SecretItem>>> {
        let mut items: Vec<SecretItem> = self
            .secrets
            .read()
            .await
            .iter()
            .map(|(name, secret)| SecretItem {
                id: Some(Self::object_id("secrets", name)),
                enabled: Some(secret.enabled),
                tags: if self.omit_list_tags {
                    HashMap::new()
                } else {
                    secret.tags.clone()
                },
            })
            .collect();
        items.extend(self.extra_items.read().await.iter().cloned());

        let mut pages: Vec<Result<Vec<SecretItem>>> = items
            .chunks(self.page_size)
            .map(|page| Ok(page.to_vec()))
            .collect();

        if let Some(ref err) = self.list_error {
            pages.push(Err(ProviderError::Other(anyhow::anyhow!("{}", err))));
        }
        pages
    }
}

impl Default for MockVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultClient for MockVault {
    async fn get_secret(&self, name: &str, version: Option<&str>) -> Result<SecretBundle> {
        self.record(ObjectKind::Secret, name, version).await;
        if let Some(ref err) = self.get_error {
            return Err(ProviderError::Other(anyhow::anyhow!("{}", err)));
        }

        let secrets = self.secrets.read().await;
        let secret = secrets
            .get(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;

        let value = match version {
            Some(v) => Some(
                secret
                    .versions
                    .get(v)
                    .cloned()
                    .ok_or_else(|| ProviderError::NotFound(format!("{name}/{v}")))?,
            ),
            None => secret.latest.clone(),
        };

        Ok(SecretBundle {
            id: Some(Self::object_id("secrets", name)),
            value,
            enabled: Some(secret.enabled),
            tags: secret.tags.clone(),
            updated_on: Some(Utc::now()),
        })
    }

    async fn get_key(&self, name: &str, version: Option<&str>) -> Result<KeyBundle> {
        self.record(ObjectKind::Key, name, version).await;
        if let Some(ref err) = self.key_error {
            return Err(ProviderError::Other(anyhow::anyhow!("{}", err)));
        }

        self.keys
            .read()
            .await
            .get(name)
            .cloned()
            .map(|key| KeyBundle { key })
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }

    async fn get_certificate(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<CertificateBundle> {
        self.record(ObjectKind::Cert, name, version).await;
        if let Some(ref err) = self.cert_error {
            return Err(ProviderError::Other(anyhow::anyhow!("{}", err)));
        }

        self.certificates
            .read()
            .await
            .get(name)
            .cloned()
            .map(|der| CertificateBundle {
                id: Some(Self::object_id("certificates", name)),
                cer: Some(der),
            })
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }

    fn list_secrets(&self) -> BoxStream<'_, Result<Vec<SecretItem>>> {
        stream::once(self.list_pages())
            .flat_map(stream::iter)
            .boxed()
    }

    fn lists_tags(&self) -> bool {
        !self.omit_list_tags
    }
}

/// In-memory Kubernetes Secrets, keyed by namespace and name.
pub struct MockKube {
    secrets: RwLock<HashMap<(String, String), BTreeMap<String, Vec<u8>>>>,

    /// Error to return from every lookup
    pub get_error: Option<ProviderError>,
}

impl MockKube {
    /// Creates a cluster with no Secrets.
    pub fn new() -> Self {
        Self {
            secrets: RwLock::new(HashMap::new()),
            get_error: None,
        }
    }

    /// Creates or replaces a Secret.
    pub async fn set_secret<'a>(
        &self,
        namespace: &str,
        name: &str,
        data: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        self.secrets
            .write()
            .await
            .insert((namespace.to_string(), name.to_string()), data);
    }
}

impl Default for MockKube {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KubeClient for MockKube {
    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<BTreeMap<String, Vec<u8>>> {
        if let Some(ref err) = self.get_error {
            return Err(anyhow::anyhow!("{}", err));
        }

        self.secrets
            .read()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("secrets \"{}\" not found", name))
    }
}

/// Connector that hands out a shared [`MockVault`] and records every authorizer.
pub struct MockConnector {
    vault: Arc<MockVault>,
    connections: RwLock<Vec<(String, Authorizer)>>,

    /// Error to return from `connect()`
    pub connect_error: Option<ProviderError>,
}

impl MockConnector {
    /// Creates a connector backed by an empty vault.
    pub fn new() -> Self {
        Self::with_vault(Arc::new(MockVault::new()))
    }

    /// Creates a connector backed by `vault`.
    pub fn with_vault(vault: Arc<MockVault>) -> Self {
        Self {
            vault,
            connections: RwLock::new(Vec::new()),
            connect_error: None,
        }
    }

    /// The vault every connection reads from.
    pub fn vault(&self) -> Arc<MockVault> {
        Arc::clone(&self.vault)
    }

    /// `(vault_url, authorizer)` pairs seen so far.
    pub async fn connections(&self) -> Vec<(String, Authorizer)> {
        self.connections.read().await.clone()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultConnector for MockConnector {
    async fn connect(
        &self,
        vault_url: &str,
        authorizer: Authorizer,
    ) -> Result<Arc<dyn VaultClient>> {
        if let Some(ref err) = self.connect_error {
            return Err(ProviderError::Authorization(err.to_string()));
        }

        self.connections
            .write()
            .await
            .push((vault_url.to_string(), authorizer));
        Ok(self.vault() as Arc<dyn VaultClient>)
    }
}
