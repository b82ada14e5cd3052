//! Create-or-update of the destination Secret

use crate::error::{K8sError, K8sResult};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use mapper_secrets::SecretBundle;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What a write did to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    /// Nothing was sent to the cluster
    DryRun,
}

/// Destination for a resolved bundle
#[async_trait]
pub trait SecretWriter: Send + Sync {
    async fn create_or_update(
        &self,
        name: &str,
        namespace: &str,
        bundle: &SecretBundle,
    ) -> K8sResult<WriteOutcome>;
}

/// Build the Opaque Secret object for `bundle`. Values are raw bytes; the
/// API layer base64-encodes `data` on the wire.
pub fn build_secret(name: &str, namespace: &str, bundle: &SecretBundle) -> Secret {
    let data: BTreeMap<String, ByteString> = bundle
        .iter()
        .map(|(key, value)| (key.clone(), ByteString(value.as_bytes().to_vec())))
        .collect();

    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(data),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// Writer backed by the Kubernetes API
pub struct KubeSecretWriter {
    client: Client,
}

impl KubeSecretWriter {
    /// Create a writer that auto-discovers cluster configuration.
    ///
    /// This will attempt to load config from:
    /// 1. In-cluster service account (when running in K8s)
    /// 2. KUBECONFIG environment variable
    /// 3. ~/.kube/config
    pub async fn new() -> K8sResult<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| K8sError::Config {
                message: e.to_string(),
            })?;
        debug!("K8s client initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretWriter for KubeSecretWriter {
    async fn create_or_update(
        &self,
        name: &str,
        namespace: &str,
        bundle: &SecretBundle,
    ) -> K8sResult<WriteOutcome> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let body = build_secret(name, namespace, bundle);

        match secrets.get(name).await {
            Ok(_) => {
                info!("Secret {} found in {} namespace, updating.", name, namespace);
                // Strategic merge keeps keys that are no longer mapped
                secrets
                    .patch(name, &PatchParams::default(), &Patch::Strategic(&body))
                    .await?;
                Ok(WriteOutcome::Updated)
            }
            Err(kube::Error::Api(err)) if err.code == 404 => {
                info!("Secret {} not found in {} namespace, creating.", name, namespace);
                match secrets.create(&PostParams::default(), &body).await {
                    Ok(_) => Ok(WriteOutcome::Created),
                    Err(kube::Error::Api(err)) if err.code == 404 => {
                        Err(K8sError::NamespaceNotFound {
                            name: namespace.into(),
                        })
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Writer that only reports what would be written
#[derive(Debug, Default)]
pub struct DryRunWriter;

#[async_trait]
impl SecretWriter for DryRunWriter {
    async fn create_or_update(
        &self,
        name: &str,
        namespace: &str,
        bundle: &SecretBundle,
    ) -> K8sResult<WriteOutcome> {
        info!(
            "Dry run: would write {} keys to Secret {} in {} namespace",
            bundle.len(),
            name,
            namespace
        );
        for (key, value) in bundle {
            info!("  {} ({} bytes)", key, value.len());
        }
        Ok(WriteOutcome::DryRun)
    }
}
