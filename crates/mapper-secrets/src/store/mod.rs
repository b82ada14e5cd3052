//! Secret store trait and implementations

pub mod memory;
pub mod vault;

use crate::error::StoreError;
use crate::types::StoreRecord;
use async_trait::async_trait;
use mapper_core::SecureString;

/// Login material for the store's Kubernetes auth method
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    /// Auth role to log in as
    pub role: String,
    /// Service account JWT
    pub jwt: SecureString,
    /// Mount path of the auth method
    pub mount: String,
}

/// Trait for secret stores
///
/// Paths are relative to the store's KV mount. A path that is known but has no
/// readable data is reported as [`StoreError::NoData`].
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Log in. `Ok(false)` means the store answered but rejected the credentials.
    async fn authenticate(&mut self, credentials: &StoreCredentials) -> Result<bool, StoreError>;

    /// Names directly under a directory path. Sub-directories end in `/`.
    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Latest record stored at `path`
    async fn read_record(&self, path: &str) -> Result<StoreRecord, StoreError>;

    /// Store name for log messages
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<S: SecretStore + ?Sized> SecretStore for &mut S {
    async fn authenticate(&mut self, credentials: &StoreCredentials) -> Result<bool, StoreError> {
        (**self).authenticate(credentials).await
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_children(path).await
    }

    async fn read_record(&self, path: &str) -> Result<StoreRecord, StoreError> {
        (**self).read_record(path).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

pub use memory::{MemoryStore, StoreCall};
pub use vault::VaultStore;
