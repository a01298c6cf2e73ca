//! Azure SDK implementations of the vault seam.

use crate::auth::Authorizer;
use crate::vault::{
    CertificateBundle, KeyBundle, SecretBundle, SecretItem, VaultClient, VaultConnector,
};
use crate::{ProviderError, Result};
use async_trait::async_trait;
use azure_core::auth::TokenCredential;
use azure_identity::{
    ClientSecretCredential, TokenCredentialOptions, VirtualMachineManagedIdentityCredential,
};
use azure_security_keyvault::KeyvaultClient;
use base64::Engine;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps an SDK error, recognizing missing objects.
fn sdk_error(e: azure_core::Error) -> ProviderError {
    let msg = e.to_string();
    if msg.contains("NotFound") || msg.contains("404") {
        ProviderError::NotFound(msg)
    } else {
        ProviderError::Other(anyhow::anyhow!("Azure error: {}", e))
    }
}

/// Builds the SDK credential for an authorizer.
///
/// The SDK only offers the system-assigned managed identity, so a
/// user-assigned client ID is rejected instead of being ignored.
fn credential(authorizer: Authorizer) -> Result<Arc<dyn TokenCredential>> {
    match authorizer {
        Authorizer::ManagedIdentity {
            client_id: Some(client_id),
        } => Err(ProviderError::NotSupported(format!(
            "user-assigned managed identity {client_id}, only system-assigned is available"
        ))),
        Authorizer::ManagedIdentity { client_id: None } => Ok(Arc::new(
            VirtualMachineManagedIdentityCredential::new(TokenCredentialOptions::default()),
        )),
        Authorizer::ServicePrincipal {
            tenant_id,
            client_id,
            client_secret,
        } => Ok(Arc::new(ClientSecretCredential::new(
            azure_core::new_http_client(),
            azure_core::authority_hosts::AZURE_PUBLIC_CLOUD.to_owned(),
            tenant_id,
            client_id,
            client_secret,
        ))),
    }
}

/// Decodes the base64 `cer` field of a certificate into DER bytes.
fn decode_cer(name: &str, cer: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(cer.trim())
        .map_err(|e| {
            ProviderError::InvalidData(format!("certificate {name} is not base64 DER: {e}"))
        })
}

/// Builds SDK credentials and Key Vault clients.
pub struct AzureSdkConnector;

#[async_trait]
impl VaultConnector for AzureSdkConnector {
    async fn connect(
        &self,
        vault_url: &str,
        authorizer: Authorizer,
    ) -> Result<Arc<dyn VaultClient>> {
        let credential = credential(authorizer)?;

        let client = KeyvaultClient::new(vault_url, credential).map_err(|e| {
            ProviderError::Authorization(format!("Failed to create Key Vault client: {}", e))
        })?;

        Ok(Arc::new(AzureSdkClient { client }))
    }
}

/// Key Vault access through the official SDK.
pub struct AzureSdkClient {
    client: KeyvaultClient,
}

impl AzureSdkClient {
    /// Wraps an already authorized SDK client.
    pub fn new(client: KeyvaultClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VaultClient for AzureSdkClient {
    async fn get_secret(&self, name: &str, version: Option<&str>) -> Result<SecretBundle> {
        let mut request = self.client.secret_client().get(name);
        if let Some(version) = version {
            request = request.version(version);
        }
        let secret = request.await.map_err(sdk_error)?;

        Ok(SecretBundle {
            id: Some(secret.id),
            value: Some(secret.value),
            enabled: Some(secret.attributes.enabled),
            // The SDK's secret model does not expose tags.
            tags: HashMap::new(),
            updated_on: chrono::DateTime::from_timestamp(
                secret.attributes.updated_on.unix_timestamp(),
                0,
            ),
        })
    }

    async fn get_key(&self, name: &str, version: Option<&str>) -> Result<KeyBundle> {
        let mut request = self.client.key_client().get(name);
        if let Some(version) = version {
            request = request.version(version);
        }
        let key = request.await.map_err(sdk_error)?;

        Ok(KeyBundle {
            key: serde_json::to_value(&key.key)?,
        })
    }

    async fn get_certificate(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<CertificateBundle> {
        let mut request = self.client.certificate_client().get(name);
        if let Some(version) = version {
            request = request.version(version);
        }
        let cert = request.await.map_err(sdk_error)?;

        Ok(CertificateBundle {
            id: Some(cert.id),
            cer: Some(decode_cer(name, cert.cer.secret())?),
        })
    }

    fn list_secrets(&self) -> BoxStream<'_, Result<Vec<SecretItem>>> {
        self.client
            .secret_client()
            .list_secrets()
            .into_stream()
            .map(|page| {
                let page = page.map_err(sdk_error)?;
                Ok(page
                    .value
                    .into_iter()
                    .map(|secret| SecretItem {
                        id: Some(secret.id),
                        enabled: Some(secret.attributes.enabled),
                        tags: HashMap::new(),
                    })
                    .collect())
            })
            .boxed()
    }

    // Listed secrets come back without tags in this SDK release.
    fn lists_tags(&self) -> bool {
        false
    }
}
