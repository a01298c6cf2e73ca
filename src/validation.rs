//! Offline validation of store configurations and find filters.

use crate::{AuthType, FindRef, ProviderError, Result, SecretKeySelector, StoreConfig};
use regex::Regex;

/// Validates the vault URL of a store.
///
/// The URL must be non-empty and use `https://`.
///
/// # Example
///
/// ```
/// use azkv_provider::validation::validate_vault_url;
///
/// assert!(validate_vault_url("https://myvault.vault.azure.net").is_ok());
/// assert!(validate_vault_url("").is_err());
/// assert!(validate_vault_url("http://myvault.vault.azure.net").is_err());
/// ```
pub fn validate_vault_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ProviderError::Config("vaultUrl cannot be empty".to_string()));
    }

    match url.strip_prefix("https://") {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ProviderError::Config(format!(
            "vaultUrl must be an https URL, got {url:?}"
        ))),
    }
}

fn validate_selector(store: &StoreConfig, field: &str, selector: &SecretKeySelector) -> Result<()> {
    if selector.name.is_empty() {
        return Err(ProviderError::Config(format!("{field}.name cannot be empty")));
    }
    if selector.key.is_empty() {
        return Err(ProviderError::Config(format!("{field}.key cannot be empty")));
    }
    if !store.is_cluster_scoped() && selector.namespace.is_some() {
        return Err(ProviderError::Config(format!(
            "{field}.namespace is only allowed in a ClusterSecretStore"
        )));
    }
    Ok(())
}

/// Validates a whole store configuration without network access.
///
/// # Errors
///
/// Returns [`ProviderError::Config`] for a bad vault URL or incomplete
/// service-principal settings, and [`ProviderError::NoValidAuthType`] when no
/// auth type is set.
pub fn validate_store(store: &StoreConfig) -> Result<()> {
    validate_vault_url(&store.vault_url)?;

    match store.auth_type {
        None => Err(ProviderError::NoValidAuthType),
        Some(AuthType::ManagedIdentity) => Ok(()),
        Some(AuthType::ServicePrincipal) => {
            if store.tenant_id.as_deref().map_or(true, str::is_empty) {
                return Err(ProviderError::Config(
                    "missing tenantID in store config".to_string(),
                ));
            }

            let refs = store.auth_secret_ref.as_ref().ok_or_else(|| {
                ProviderError::Config("missing clientID/clientSecret in store config".to_string())
            })?;

            match (&refs.client_id, &refs.client_secret) {
                (Some(id), Some(secret)) => {
                    validate_selector(store, "authSecretRef.clientId", id)?;
                    validate_selector(store, "authSecretRef.clientSecret", secret)
                }
                _ => Err(ProviderError::Config(
                    "missing clientID/clientSecret in store config".to_string(),
                )),
            }
        }
    }
}

/// Compiles the name filter of `find`, if any.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidRegex`] if the expression does not compile.
pub fn compile_name_filter(find: &FindRef) -> Result<Option<Regex>> {
    find.name_regexp()
        .map(Regex::new)
        .transpose()
        .map_err(ProviderError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp_store() -> StoreConfig {
        StoreConfig::new("https://kv.vault.azure.net")
            .with_auth_type(AuthType::ServicePrincipal)
            .with_tenant_id("tenant")
            .with_client_id_ref(SecretKeySelector::new("creds", "id"))
            .with_client_secret_ref(SecretKeySelector::new("creds", "secret"))
    }

    #[test]
    fn test_valid_stores() {
        assert!(validate_store(&sp_store()).is_ok());
        let mi = StoreConfig::new("https://kv.vault.azure.net")
            .with_auth_type(AuthType::ManagedIdentity);
        assert!(validate_store(&mi).is_ok());
    }

    #[test]
    fn test_bad_urls() {
        for url in ["", "kv.vault.azure.net", "http://kv", "https://", "https:///path"] {
            assert!(validate_vault_url(url).is_err(), "expected {url:?} to fail");
        }
    }

    #[test]
    fn test_missing_auth_type() {
        let store = StoreConfig::new("https://kv.vault.azure.net");
        assert!(matches!(
            validate_store(&store),
            Err(ProviderError::NoValidAuthType)
        ));
    }

    #[test]
    fn test_service_principal_gaps() {
        let mut store = sp_store();
        store.tenant_id = Some(String::new());
        assert!(validate_store(&store).unwrap_err().to_string().contains("tenantID"));

        let mut store = sp_store();
        store.auth_secret_ref = None;
        assert!(validate_store(&store).is_err());

        let store = sp_store().with_client_id_ref(SecretKeySelector::new("", "id"));
        assert!(validate_store(&store)
            .unwrap_err()
            .to_string()
            .contains("clientId.name"));
    }

    #[test]
    fn test_selector_namespace_needs_cluster_store() {
        let store = sp_store()
            .with_client_secret_ref(SecretKeySelector::new("creds", "secret").in_namespace("ops"));
        assert!(validate_store(&store).is_err());
        assert!(validate_store(&store.cluster_scoped()).is_ok());
    }

    #[test]
    fn test_compile_name_filter() {
        assert!(compile_name_filter(&FindRef::new()).unwrap().is_none());

        let re = compile_name_filter(&FindRef::new().with_name_regexp("^db-")).unwrap();
        assert!(re.unwrap().is_match("db-pass"));

        let err = compile_name_filter(&FindRef::new().with_name_regexp("(")).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRegex(_)));
    }
}
