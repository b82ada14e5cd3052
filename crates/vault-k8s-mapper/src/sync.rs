//! The sync pipeline: configuration, token, mapping, resolution, write

use crate::cli::Cli;
use anyhow::{Context, Result};
use mapper_core::MapperConfig;
use mapper_k8s::{DryRunWriter, KubeSecretWriter, SecretWriter, WriteOutcome};
use mapper_secrets::{
    parse_sources, resolve_secrets, MappingEntry, ResolutionWarning, SecretStore,
    StoreCredentials, VaultStore,
};
use tracing::{info, warn};

/// Where the resolved bundle goes
#[derive(Debug, Clone)]
pub struct SyncTarget {
    pub name: String,
    pub namespace: String,
}

/// Result of a completed run
#[derive(Debug)]
pub struct SyncReport {
    pub name: String,
    pub namespace: String,
    pub keys: Vec<String>,
    pub warnings: Vec<ResolutionWarning>,
    pub outcome: WriteOutcome,
}

/// Run the whole job from the environment
pub async fn run(cli: &Cli) -> Result<SyncReport> {
    let config = MapperConfig::load(cli.env_file.as_deref().map(|p| p.as_std_path()))
        .context("Invalid configuration")?;

    let jwt = config
        .credentials
        .load()
        .context("Could not load the Kubernetes service account token")?;

    let entries = parse_sources(&config.secret_sources, &config.default_key)
        .context("Invalid SECRET_SOURCES")?;
    info!(
        "Secret source mappings: {}",
        entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let store = VaultStore::new(&config.vault).context("Could not create Vault client")?;
    let credentials = StoreCredentials {
        role: config.vault.role.clone(),
        jwt,
        mount: config.vault.auth_path.clone(),
    };
    let target = SyncTarget {
        name: config.secret_target.clone(),
        namespace: config.namespace.clone(),
    };

    if cli.dry_run {
        sync_secrets(store, &credentials, &entries, &target, &DryRunWriter).await
    } else {
        let writer = KubeSecretWriter::new()
            .await
            .context("Could not create Kubernetes client")?;
        sync_secrets(store, &credentials, &entries, &target, &writer).await
    }
}

/// Resolve `entries` against `store` and hand the bundle to `writer`.
///
/// Any resolution failure returns before the writer is called, so the
/// destination Secret is never left partially written.
pub async fn sync_secrets<S, W>(
    store: S,
    credentials: &StoreCredentials,
    entries: &[MappingEntry],
    target: &SyncTarget,
    writer: &W,
) -> Result<SyncReport>
where
    S: SecretStore,
    W: SecretWriter + ?Sized,
{
    let backend = store.name();
    let resolution = resolve_secrets(store, credentials, entries)
        .await
        .with_context(|| format!("Failed to resolve secrets from {}", backend))?;

    if resolution.bundle.is_empty() {
        warn!("No secrets resolved, {} will be written empty", target.name);
    }

    let outcome = writer
        .create_or_update(&target.name, &target.namespace, &resolution.bundle)
        .await
        .with_context(|| {
            format!(
                "Failed to write Secret {} in {} namespace",
                target.name, target.namespace
            )
        })?;

    Ok(SyncReport {
        name: target.name.clone(),
        namespace: target.namespace.clone(),
        keys: resolution.bundle.keys().map(str::to_string).collect(),
        warnings: resolution.warnings,
        outcome,
    })
}
