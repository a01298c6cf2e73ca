//! Azure Key Vault secrets client.

use crate::property;
use crate::reference::{parse_kind, ObjectKind, ObjectRef};
use crate::validation::compile_name_filter;
use crate::vault::{SecretItem, VaultClient};
use crate::{FindRef, ProviderError, RemoteRef, Result, SecretsClient};
use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Reads secrets, keys and certificates from one vault.
///
/// Built by [`AzureProvider`](super::AzureProvider) once authorization has
/// succeeded. Holds no state besides the vault client.
pub struct AzureKeyVault {
    client: Arc<dyn VaultClient>,
    vault_url: String,
}

impl AzureKeyVault {
    /// Wraps an authorized vault client.
    pub fn new(client: Arc<dyn VaultClient>, vault_url: impl Into<String>) -> Self {
        Self {
            client,
            vault_url: vault_url.into(),
        }
    }

    /// URL of the vault this client reads from.
    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }

    async fn secret_value(&self, name: &str, version: Option<&str>) -> Result<String> {
        let bundle = self
            .client
            .get_secret(name, version)
            .await
            .map_err(|e| ProviderError::vault_op("get-secret", name, e))?;

        bundle
            .value
            .ok_or_else(|| ProviderError::NotFound(format!("secret {name} has no value")))
    }

    async fn get_secret_object(&self, name: &str, reference: &RemoteRef) -> Result<Vec<u8>> {
        let value = self.secret_value(name, reference.version()).await?;

        let Some(path) = reference.property() else {
            return Ok(value.into_bytes());
        };

        let json: serde_json::Value = serde_json::from_str(&value).map_err(|e| {
            ProviderError::InvalidData(format!(
                "secret {name} is not JSON, cannot select property {path}: {e}"
            ))
        })?;

        property::lookup(&json, path)
            .map(|selected| property::render(selected).into_bytes())
            .ok_or_else(|| ProviderError::PropertyNotFound {
                property: path.to_string(),
                key: reference.key.clone(),
            })
    }

    async fn get_certificate_object(&self, name: &str, version: Option<&str>) -> Result<Vec<u8>> {
        let bundle = self
            .client
            .get_certificate(name, version)
            .await
            .map_err(|e| ProviderError::vault_op("get-certificate", name, e))?;

        bundle
            .cer
            .ok_or_else(|| ProviderError::NotFound(format!("certificate {name} has no content")))
    }

    async fn get_key_object(&self, name: &str, version: Option<&str>) -> Result<Vec<u8>> {
        let bundle = self
            .client
            .get_key(name, version)
            .await
            .map_err(|e| ProviderError::vault_op("get-key", name, e))?;

        Ok(serde_json::to_vec(&bundle.key)?)
    }
}

/// Decides whether a listed secret is part of a bulk read.
///
/// Returns the secret name when it is. Items with no identifier are skipped
/// rather than failing the listing.
fn select_item<'a>(
    item: &'a SecretItem,
    find: &FindRef,
    name_filter: Option<&Regex>,
) -> Option<&'a str> {
    let Some(name) = item.name() else {
        tracing::debug!("Skipping listed secret without identifier");
        return None;
    };

    if item.enabled == Some(false) {
        tracing::debug!(secret = %name, "Skipping disabled secret");
        return None;
    }

    let tags_match = find
        .tags
        .iter()
        .all(|(k, v)| item.tags.get(k).is_some_and(|actual| actual == v));
    if !tags_match {
        return None;
    }

    if let Some(re) = name_filter {
        if !re.is_match(name) {
            return None;
        }
    }

    Some(name)
}

#[async_trait]
impl SecretsClient for AzureKeyVault {
    async fn get_secret(&self, reference: &RemoteRef) -> Result<Vec<u8>> {
        let object = ObjectRef::parse(&reference.key)?;
        let version = reference.version();

        tracing::debug!(
            kind = %object.kind(),
            name = %object.name(),
            version = version.unwrap_or("latest"),
            "Fetching object from Azure Key Vault"
        );

        match &object {
            ObjectRef::Secret(name) => self.get_secret_object(name, reference).await,
            ObjectRef::Cert(name) => self.get_certificate_object(name, version).await,
            ObjectRef::Key(name) => self.get_key_object(name, version).await,
        }
    }

    async fn get_secret_map(&self, reference: &RemoteRef) -> Result<HashMap<String, Vec<u8>>> {
        match parse_kind(&reference.key)? {
            ObjectKind::Secret => {}
            kind @ (ObjectKind::Cert | ObjectKind::Key) => {
                return Err(ProviderError::NotSupported(format!(
                    "cannot use dataFrom to get {kind} secret"
                )));
            }
        }

        let data = self.get_secret(reference).await?;
        let kv: HashMap<String, String> = serde_json::from_slice(&data)?;

        Ok(kv.into_iter().map(|(k, v)| (k, v.into_bytes())).collect())
    }

    async fn get_all_secrets(&self, find: &FindRef) -> Result<HashMap<String, Vec<u8>>> {
        if !find.tags.is_empty() && !self.client.lists_tags() {
            return Err(ProviderError::NotSupported(format!(
                "cannot filter secrets by tags: listing of {} does not report tags",
                self.vault_url
            )));
        }

        let name_filter = compile_name_filter(find)?;
        let mut secrets = HashMap::new();
        let mut pages = self.client.list_secrets();

        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| ProviderError::vault_op("list-secrets", &self.vault_url, e))?;

            for item in &page {
                let Some(name) = select_item(item, find, name_filter.as_ref()) else {
                    continue;
                };

                let value = self.secret_value(name, None).await?;
                secrets.insert(name.to_string(), value.into_bytes());
            }
        }

        tracing::debug!(
            vault = %self.vault_url,
            count = secrets.len(),
            "Listed secrets from Azure Key Vault"
        );

        Ok(secrets)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::{MockVault, VaultRequest};

    fn item(name: &str, enabled: Option<bool>, tags: &[(&str, &str)]) -> SecretItem {
        SecretItem {
            id: Some(format!("https://kv.vault.azure.net/secrets/{name}")),
            enabled,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn client(vault: MockVault) -> AzureKeyVault {
        AzureKeyVault::new(Arc::new(vault), "https://kv.vault.azure.net")
    }

    #[test]
    fn test_select_item_filters() {
        let find = FindRef::new().with_tag("env", "prod").with_name_regexp("^db");
        let re = compile_name_filter(&find).unwrap();
        let re = re.as_ref();

        let prod = [("env", "prod")];

        let enabled = item("db-pass", Some(true), &prod);
        assert_eq!(select_item(&enabled, &find, re), Some("db-pass"));

        let unflagged = item("db-pass", None, &prod);
        assert_eq!(select_item(&unflagged, &find, re), Some("db-pass"));

        let disabled = item("db-pass", Some(false), &prod);
        assert_eq!(select_item(&disabled, &find, re), None);

        let wrong_tag = item("db-pass", Some(true), &[("env", "dev")]);
        assert_eq!(select_item(&wrong_tag, &find, re), None);

        let untagged = item("db-pass", Some(true), &[]);
        assert_eq!(select_item(&untagged, &find, re), None);

        let wrong_name = item("api-key", Some(true), &prod);
        assert_eq!(select_item(&wrong_name, &find, re), None);

        assert_eq!(select_item(&SecretItem::default(), &FindRef::new(), None), None);
    }

    #[tokio::test]
    async fn test_get_secret_raw_value() {
        let vault = MockVault::new();
        vault.set_secret("db/pass", "hunter2").await;

        let kv = client(vault);
        let value = kv.get_secret(&RemoteRef::new("secret/db/pass")).await.unwrap();
        assert_eq!(value, b"hunter2");
    }

    #[tokio::test]
    async fn test_get_secret_property() {
        let vault = MockVault::new();
        vault.set_secret("creds", r#"{"user":"a","pass":"b"}"#).await;
        let kv = client(vault);

        let user = kv
            .get_secret(&RemoteRef::new("creds").with_property("user"))
            .await
            .unwrap();
        assert_eq!(user, b"a");

        let err = kv
            .get_secret(&RemoteRef::new("creds").with_property("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "property missing does not exist in key creds");
    }

    #[tokio::test]
    async fn test_get_secret_property_on_plain_value() {
        let vault = MockVault::new();
        vault.set_secret("plain", "not json").await;

        let err = client(vault)
            .get_secret(&RemoteRef::new("plain").with_property("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_get_secret_version_is_forwarded() {
        let vault = MockVault::new();
        vault.set_secret_version("rotating", "v1", "old").await;
        vault.set_secret("rotating", "new").await;
        let kv = client(vault);

        let old = kv
            .get_secret(&RemoteRef::new("rotating").with_version("v1"))
            .await
            .unwrap();
        assert_eq!(old, b"old");

        let latest = kv.get_secret(&RemoteRef::new("rotating")).await.unwrap();
        assert_eq!(latest, b"new");
    }

    #[tokio::test]
    async fn test_get_cert_and_key() {
        let vault = MockVault::new();
        vault.set_certificate("tls", vec![0x30, 0x82, 0x01, 0x0a]).await;
        vault
            .set_key("signing", serde_json::json!({"kty": "RSA", "n": "abc", "e": "AQAB"}))
            .await;
        let kv = client(vault);

        let cer = kv.get_secret(&RemoteRef::new("cert/tls")).await.unwrap();
        assert_eq!(cer, vec![0x30, 0x82, 0x01, 0x0a]);

        let jwk = kv.get_secret(&RemoteRef::new("key/signing")).await.unwrap();
        let jwk: serde_json::Value = serde_json::from_slice(&jwk).unwrap();
        assert_eq!(jwk["kty"], "RSA");
        assert_eq!(jwk["e"], "AQAB");
    }

    #[tokio::test]
    async fn test_cert_and_key_versions_are_forwarded() {
        let vault = Arc::new(MockVault::new());
        vault.set_certificate("tls", vec![0x30]).await;
        vault.set_key("signing", serde_json::json!({"kty": "EC"})).await;
        let kv = AzureKeyVault::new(vault.clone(), "https://kv.vault.azure.net");

        kv.get_secret(&RemoteRef::new("cert/tls").with_version("v2"))
            .await
            .unwrap();
        kv.get_secret(&RemoteRef::new("key/signing").with_version("v7"))
            .await
            .unwrap();

        assert_eq!(
            vault.requests().await,
            vec![
                VaultRequest {
                    kind: ObjectKind::Cert,
                    name: "tls".to_string(),
                    version: Some("v2".to_string()),
                },
                VaultRequest {
                    kind: ObjectKind::Key,
                    name: "signing".to_string(),
                    version: Some("v7".to_string()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_name_fails_for_every_kind() {
        let kv = client(MockVault::new());
        for key in ["", "secret/", "cert/", "key/"] {
            let err = kv.get_secret(&RemoteRef::new(key)).await.unwrap_err();
            assert!(matches!(err, ProviderError::EmptyName(_)), "{key:?}: {err}");
        }
    }

    #[tokio::test]
    async fn test_unknown_kind() {
        let err = client(MockVault::new())
            .get_secret(&RemoteRef::new("blob/thing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownObjectType(_)));
    }

    #[tokio::test]
    async fn test_get_secret_map() {
        let vault = MockVault::new();
        vault.set_secret("creds", r#"{"user":"a","pass":"b"}"#).await;
        vault.set_secret("nested", r#"{"user":{"name":"a"}}"#).await;
        let kv = client(vault);

        let map = kv.get_secret_map(&RemoteRef::new("creds")).await.unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["user"], b"a");
        assert_eq!(map["pass"], b"b");

        let err = kv.get_secret_map(&RemoteRef::new("nested")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Json(_)));
    }

    #[tokio::test]
    async fn test_get_secret_map_rejects_cert_and_key() {
        let vault = MockVault::new();
        vault.set_certificate("tls", vec![1, 2, 3]).await;
        let kv = client(vault);

        for key in ["cert/tls", "key/signing", "cert/", "key/"] {
            let err = kv.get_secret_map(&RemoteRef::new(key)).await.unwrap_err();
            assert!(err.is_not_supported(), "{key:?}: {err}");
        }
    }

    #[tokio::test]
    async fn test_get_all_secrets_applies_filters() {
        let vault = MockVault::new();
        vault.set_secret_with_tags("db-pass", "p", [("env", "prod")]).await;
        vault.set_secret_with_tags("db-user", "u", [("env", "dev")]).await;
        vault.set_secret_with_tags("api-key", "k", [("env", "prod")]).await;
        vault.set_secret("db-disabled", "d").await;
        vault.disable("db-disabled").await;
        let kv = client(vault);

        let all = kv.get_all_secrets(&FindRef::new()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(!all.contains_key("db-disabled"));

        let find = FindRef::new().with_name_regexp("^db-").with_tag("env", "prod");
        let filtered = kv.get_all_secrets(&find).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["db-pass"], b"p");
    }

    #[tokio::test]
    async fn test_tag_filter_without_listed_tags_is_unsupported() {
        let mut vault = MockVault::new();
        vault.set_secret_with_tags("db-pass", "p", [("env", "prod")]).await;
        vault.omit_list_tags = true;
        let kv = client(vault);

        let err = kv
            .get_all_secrets(&FindRef::new().with_tag("env", "prod"))
            .await
            .unwrap_err();
        assert!(err.is_not_supported(), "{err}");

        // Without a tag filter the listing still works.
        let all = kv
            .get_all_secrets(&FindRef::new().with_name_regexp("^db-"))
            .await
            .unwrap();
        assert_eq!(all["db-pass"], b"p");
    }

    #[tokio::test]
    async fn test_get_all_secrets_skips_items_without_id() {
        let vault = MockVault::new();
        vault.set_secret("db-pass", "p").await;
        vault.push_list_item(SecretItem::default()).await;

        let all = client(vault).get_all_secrets(&FindRef::new()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_secrets_aborts_on_errors() {
        let mut vault = MockVault::new();
        vault.set_secret("db-pass", "p").await;
        vault.list_error = Some(ProviderError::Authorization("token expired".to_string()));
        assert!(client(vault).get_all_secrets(&FindRef::new()).await.is_err());

        let mut vault = MockVault::new();
        vault.set_secret("db-pass", "p").await;
        vault.get_error = Some(ProviderError::NotFound("db-pass".to_string()));
        assert!(client(vault).get_all_secrets(&FindRef::new()).await.is_err());

        let err = client(MockVault::new())
            .get_all_secrets(&FindRef::new().with_name_regexp("["))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRegex(_)));
    }

    #[tokio::test]
    async fn test_close_is_noop() {
        let kv = client(MockVault::new());
        assert!(kv.close().await.is_ok());
        assert_eq!(kv.vault_url(), "https://kv.vault.azure.net");
    }
}
