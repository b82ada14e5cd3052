//! Secret resolution
//!
//! A run moves through `Unauthenticated -> Authenticated -> processing -> done`:
//! [`SecretResolver::authenticate`] consumes the unauthenticated resolver and
//! [`AuthenticatedResolver::resolve`] consumes the authenticated one, so a
//! resolver can neither fetch before login nor be reused after a run.
//!
//! Entries are processed one at a time in parse order:
//! - Directory paths (trailing `/`) are listed and each child read. Children
//!   with unusable names, no data, or no matching field are skipped with a
//!   warning.
//! - Direct paths are read once. A path with metadata but no data is fatal;
//!   a missing field is skipped with a warning.

use crate::error::{ResolveError, StoreError};
use crate::mapping::{is_valid_identifier, MappingEntry};
use crate::store::{SecretStore, StoreCredentials};
use crate::types::{Resolution, ResolutionWarning, SecretValue};
use tracing::{debug, error, info, warn};

/// Resolver that has not logged in yet
pub struct SecretResolver<S: SecretStore> {
    store: S,
}

/// Resolver holding an authenticated store
pub struct AuthenticatedResolver<S: SecretStore> {
    store: S,
}

impl<S: SecretStore> SecretResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Log in once. Failure ends the run before any fetch.
    pub async fn authenticate(
        mut self,
        credentials: &StoreCredentials,
    ) -> Result<AuthenticatedResolver<S>, ResolveError> {
        debug!(
            "Authenticating against {} as role {} via {}",
            self.store.name(),
            credentials.role,
            credentials.mount
        );

        match self.store.authenticate(credentials).await {
            Ok(true) => {
                info!("Authenticated against {} successfully.", self.store.name());
                Ok(AuthenticatedResolver { store: self.store })
            }
            Ok(false) => Err(ResolveError::Authentication {
                message: format!(
                    "role '{}' was rejected by auth mount '{}'",
                    credentials.role, credentials.mount
                ),
            }),
            Err(e) => Err(ResolveError::Authentication {
                message: e.to_string(),
            }),
        }
    }
}

impl<S: SecretStore> AuthenticatedResolver<S> {
    /// Resolve every entry into one bundle
    pub async fn resolve(self, entries: &[MappingEntry]) -> Result<Resolution, ResolveError> {
        let mut resolution = Resolution::default();

        for entry in entries {
            if entry.is_directory() {
                self.resolve_directory(entry, &mut resolution).await?;
            } else {
                self.resolve_direct(entry, &mut resolution).await?;
            }
        }

        debug!(
            "Resolved {} keys with {} warnings",
            resolution.bundle.len(),
            resolution.warnings.len()
        );
        Ok(resolution)
    }

    async fn resolve_directory(
        &self,
        entry: &MappingEntry,
        resolution: &mut Resolution,
    ) -> Result<(), ResolveError> {
        info!("Found path ending in /, listing secrets for {}", entry.path);

        let key_prefix = match &entry.target {
            Some(target) => {
                info!("Target set, prepending secrets with '{}_'", target);
                format!("{}_", target)
            }
            None => String::new(),
        };

        let names = self
            .store
            .list_children(&entry.path)
            .await
            .map_err(|source| ResolveError::List {
                path: entry.path.clone(),
                source,
            })?;

        for name in names {
            if !is_valid_identifier(&name) {
                warn!("Not a valid Secret mapping key, skipping: '{}'", name);
                resolution.warn(ResolutionWarning::InvalidName {
                    path: entry.path.clone(),
                    name,
                });
                continue;
            }

            let sub_path = format!("{}{}", entry.path, name);
            info!("Found sub-path {}", sub_path);

            let record = match self.store.read_record(&sub_path).await {
                Ok(record) => record,
                Err(StoreError::NoData { .. }) => {
                    warn!(
                        "Sub-path {} metadata exists but contains no data, skipping.",
                        sub_path
                    );
                    resolution.warn(ResolutionWarning::NoData { path: sub_path });
                    continue;
                }
                Err(source) => {
                    return Err(ResolveError::Read {
                        path: sub_path,
                        source,
                    })
                }
            };

            let Some(value) = record.value(&entry.key) else {
                warn!("Sub-path {} missing key {}, skipping", sub_path, entry.key);
                resolution.warn(ResolutionWarning::MissingKey {
                    path: sub_path,
                    key: entry.key.clone(),
                });
                continue;
            };

            insert(resolution, format!("{}{}", key_prefix, name), value, &sub_path);
        }

        Ok(())
    }

    async fn resolve_direct(
        &self,
        entry: &MappingEntry,
        resolution: &mut Resolution,
    ) -> Result<(), ResolveError> {
        info!("Found direct path, fetching secret {}", entry.path);

        let record = match self.store.read_record(&entry.path).await {
            Ok(record) => record,
            Err(StoreError::NoData { .. }) => {
                error!(
                    "Path {} metadata exists but contains no data, stopping.",
                    entry.path
                );
                return Err(ResolveError::DanglingReference {
                    path: entry.path.clone(),
                    entry: entry.to_string(),
                });
            }
            Err(source) => {
                return Err(ResolveError::Read {
                    path: entry.path.clone(),
                    source,
                })
            }
        };

        let Some(value) = record.value(&entry.key) else {
            warn!("Path {} missing key {}, skipping", entry.path, entry.key);
            resolution.warn(ResolutionWarning::MissingKey {
                path: entry.path.clone(),
                key: entry.key.clone(),
            });
            return Ok(());
        };

        let leaf = entry.leaf_name();
        let destination = match &entry.target {
            Some(target) => {
                info!("Overriding target {} -> {}", leaf, target);
                target.clone()
            }
            None => leaf.to_string(),
        };

        if !is_valid_identifier(&destination) {
            warn!(
                "Path {} does not end in a valid Secret key, skipping: '{}'",
                entry.path, destination
            );
            resolution.warn(ResolutionWarning::InvalidName {
                path: entry.path.clone(),
                name: destination,
            });
            return Ok(());
        }

        insert(resolution, destination, value, &entry.path);
        Ok(())
    }
}

fn insert(resolution: &mut Resolution, key: String, value: SecretValue, from: &str) {
    if resolution.bundle.insert(key.clone(), value).is_some() {
        debug!("Key {} overwritten by {}", key, from);
    }
}

/// Authenticate and resolve in one call
pub async fn resolve_secrets<S: SecretStore>(
    store: S,
    credentials: &StoreCredentials,
    entries: &[MappingEntry],
) -> Result<Resolution, ResolveError> {
    SecretResolver::new(store)
        .authenticate(credentials)
        .await?
        .resolve(entries)
        .await
}
