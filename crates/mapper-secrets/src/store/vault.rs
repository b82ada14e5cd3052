//! HashiCorp Vault KV v2 secret store

use super::{SecretStore, StoreCredentials};
use crate::error::StoreError;
use crate::types::StoreRecord;
use async_trait::async_trait;
use mapper_core::{RetryConfig, VaultSettings};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, warn};
use vaultrs::auth::kubernetes;
use vaultrs::client::{Client, VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::{kv2, token};

pub struct VaultStore {
    client: VaultClient,
    kv_mount: String,
    retry: RetryConfig,
}

impl VaultStore {
    /// Build a client for `settings`. No request is made until `authenticate`.
    pub fn new(settings: &VaultSettings) -> Result<Self, StoreError> {
        let mut builder = VaultClientSettingsBuilder::default();
        builder.address(&settings.address);
        builder.timeout(Some(settings.timeout));

        if let Some(ns) = &settings.namespace {
            builder.namespace(Some(ns.clone()));
        }

        if settings.insecure_skip_verify {
            warn!("TLS verification disabled");
            builder.verify(false);
        }

        let client_settings = builder.build().map_err(|e| StoreError::Client {
            message: e.to_string(),
        })?;
        let client = VaultClient::new(client_settings).map_err(|e| StoreError::Client {
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            kv_mount: settings.kv_mount.clone(),
            retry: settings.retry.clone(),
        })
    }

    /// Run `op`, retrying transport failures with exponential backoff
    async fn with_retry<T, F, Fut>(&self, path: &str, op: F) -> Result<T, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0;
        let mut delay = self.retry.base_delay;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < self.retry.max_attempts => {
                    warn!(
                        "Vault request for {} failed (attempt {}/{}): {}",
                        path,
                        attempt + 1,
                        self.retry.max_attempts,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.retry.max_delay);
                    attempt += 1;
                }
                Err(e) => return Err(map_client_error(path, e)),
            }
        }
    }
}

/// KV v2 request paths are relative to the mount
fn relative(path: &str) -> &str {
    path.trim_start_matches('/')
}

fn is_transient(error: &ClientError) -> bool {
    match error {
        ClientError::RestClientError { .. } => true,
        ClientError::APIError { code, .. } => *code >= 500,
        _ => false,
    }
}

fn map_client_error(path: &str, error: ClientError) -> StoreError {
    match error {
        ClientError::APIError { code: 404, .. } | ClientError::ResponseDataEmptyError => {
            StoreError::NoData {
                path: path.to_string(),
            }
        }
        ClientError::APIError {
            code: 401 | 403,
            errors,
        } => StoreError::Unauthorized {
            message: errors.join("; "),
        },
        other => StoreError::Backend {
            path: path.to_string(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl SecretStore for VaultStore {
    async fn authenticate(&mut self, credentials: &StoreCredentials) -> Result<bool, StoreError> {
        let login = kubernetes::login(
            &self.client,
            &credentials.mount,
            &credentials.role,
            credentials.jwt.expose(),
        )
        .await;

        let auth = match login {
            Ok(auth) => auth,
            Err(ClientError::APIError { code, errors }) if (400..500).contains(&code) => {
                warn!(
                    "Vault rejected login for role {} (HTTP {}): {}",
                    credentials.role,
                    code,
                    errors.join("; ")
                );
                return Ok(false);
            }
            Err(e) => {
                return Err(map_client_error(
                    &format!("auth/{}/login", credentials.mount),
                    e,
                ))
            }
        };

        self.client.set_token(&auth.client_token);

        // Confirm the issued token is usable before reporting success
        match token::lookup_self(&self.client).await {
            Ok(_) => {
                debug!("Vault token lookup successful");
                Ok(true)
            }
            Err(ClientError::APIError { code: 401 | 403, .. }) => Ok(false),
            Err(e) => Err(map_client_error("auth/token/lookup-self", e)),
        }
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let client = &self.client;
        let mount = self.kv_mount.as_str();
        let relative_path = relative(path);

        let names = self
            .with_retry(path, move || kv2::list(client, mount, relative_path))
            .await?;
        debug!("Listed {} items under {}/{}", names.len(), mount, path);
        Ok(names)
    }

    async fn read_record(&self, path: &str) -> Result<StoreRecord, StoreError> {
        let client = &self.client;
        let mount = self.kv_mount.as_str();
        let relative_path = relative(path);

        let fields: HashMap<String, Value> = self
            .with_retry(path, move || {
                kv2::read::<HashMap<String, Value>>(client, mount, relative_path)
            })
            .await?;
        debug!("Successfully read secret from Vault: {}/{}", mount, path);
        Ok(StoreRecord::new(fields))
    }

    fn name(&self) -> &'static str {
        "vault"
    }
}
