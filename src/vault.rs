//! Vault access seam.
//!
//! [`VaultClient`] is the narrow slice of the Key Vault SDK the provider
//! uses. [`VaultConnector`] builds one from an [`Authorizer`]. Keeping both
//! behind traits lets the adapter run against the in-memory mock in tests
//! and against the Azure SDK in production.

use crate::auth::Authorizer;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::Arc;

/// A secret and its metadata as returned by get-secret.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretBundle {
    /// Full object identifier (URL)
    pub id: Option<String>,
    /// Secret value
    pub value: Option<String>,
    /// Enabled flag, when the vault reports one
    pub enabled: Option<bool>,
    /// Object tags
    pub tags: HashMap<String, String>,
    /// Last modification time
    pub updated_on: Option<DateTime<Utc>>,
}

/// A key as returned by get-key. Only public material is ever present.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBundle {
    /// JSON web key
    pub key: serde_json::Value,
}

/// A certificate as returned by get-certificate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertificateBundle {
    /// Full object identifier (URL)
    pub id: Option<String>,
    /// DER-encoded X.509 certificate
    pub cer: Option<Vec<u8>>,
}

/// One entry of the secret listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretItem {
    /// Full object identifier (URL); the name is its last path segment
    pub id: Option<String>,
    /// Enabled flag, when the vault reports one
    pub enabled: Option<bool>,
    /// Object tags
    pub tags: HashMap<String, String>,
}

impl SecretItem {
    /// Secret name derived from the identifier.
    pub fn name(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(|id| id.trim_end_matches('/'))
            .and_then(|id| id.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

/// Operations the provider needs from the Key Vault SDK.
///
/// Versions are `None` for "latest".
#[async_trait]
pub trait VaultClient: Send + Sync {
    /// Fetches a secret.
    async fn get_secret(&self, name: &str, version: Option<&str>) -> Result<SecretBundle>;

    /// Fetches a key's public material.
    async fn get_key(&self, name: &str, version: Option<&str>) -> Result<KeyBundle>;

    /// Fetches a certificate.
    async fn get_certificate(&self, name: &str, version: Option<&str>)
        -> Result<CertificateBundle>;

    /// Lists every secret in the vault, one page per stream element.
    fn list_secrets(&self) -> BoxStream<'_, Result<Vec<SecretItem>>>;

    /// Whether listed items carry their tags.
    ///
    /// Clients returning `false` leave [`SecretItem::tags`] empty, so tag
    /// filters cannot be evaluated against their listings.
    fn lists_tags(&self) -> bool {
        true
    }
}

/// Builds an authorized [`VaultClient`].
#[async_trait]
pub trait VaultConnector: Send + Sync {
    /// Connects to `vault_url` using `authorizer`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Authorization`](crate::ProviderError::Authorization)
    /// when the SDK refuses the credential.
    async fn connect(&self, vault_url: &str, authorizer: Authorizer)
        -> Result<Arc<dyn VaultClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_name_from_id() {
        let item = SecretItem {
            id: Some("https://kv.vault.azure.net/secrets/db-pass".to_string()),
            ..Default::default()
        };
        assert_eq!(item.name(), Some("db-pass"));

        let trailing = SecretItem {
            id: Some("https://kv.vault.azure.net/secrets/api/".to_string()),
            ..Default::default()
        };
        assert_eq!(trailing.name(), Some("api"));

        assert_eq!(SecretItem::default().name(), None);
    }
}
