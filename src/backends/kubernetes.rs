//! `kube` implementation of [`KubeClient`].

use crate::kubernetes::KubeClient;
use crate::{ProviderError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::collections::BTreeMap;

/// Reads Secrets through the Kubernetes API server.
#[derive(Clone)]
pub struct KubeApiClient {
    client: Client,
}

impl KubeApiClient {
    /// Wraps an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects with in-cluster config, falling back to the local kubeconfig.
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await.map_err(|e| {
            ProviderError::Other(anyhow::anyhow!("Failed to create K8s client: {}", e))
        })?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl KubeClient for KubeApiClient {
    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<BTreeMap<String, Vec<u8>>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api.get(name).await?;

        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.0))
            .collect())
    }
}
