//! In-memory secret store
//!
//! Behaves like a KV v2 mount: listings are derived from stored paths,
//! "metadata only" paths answer with `NoData`, and nothing is readable before
//! a successful login. Every call is recorded so callers can assert on the
//! order of store traffic.

use super::{SecretStore, StoreCredentials};
use crate::error::StoreError;
use crate::types::StoreRecord;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

/// A call made against a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Authenticate { role: String, mount: String },
    List(String),
    Read(String),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, StoreRecord>,
    metadata_only: BTreeSet<String>,
    failures: HashMap<String, StoreError>,
    accepted_jwt: Option<String>,
    authenticated: bool,
    calls: Mutex<Vec<StoreCall>>,
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record of string fields at `path`
    pub fn with_record<K, V>(mut self, path: &str, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.records
            .insert(normalize(path), StoreRecord::from_pairs(fields));
        self
    }

    /// Register a path whose metadata exists but whose data does not
    pub fn with_metadata_only(mut self, path: &str) -> Self {
        self.metadata_only.insert(normalize(path));
        self
    }

    /// Make every list or read of `path` fail with `error`
    pub fn with_failure(mut self, path: &str, error: StoreError) -> Self {
        self.failures.insert(normalize(path), error);
        self
    }

    /// Only accept this JWT on login. Any non-empty JWT is accepted otherwise.
    pub fn accepting(mut self, jwt: &str) -> Self {
        self.accepted_jwt = Some(jwt.to_string());
        self
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock_calls().clone()
    }

    fn record(&self, call: StoreCall) {
        self.lock_calls().push(call);
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<StoreCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_access(&self, path: &str) -> Result<(), StoreError> {
        if !self.authenticated {
            return Err(StoreError::Unauthorized {
                message: "missing client token".to_string(),
            });
        }
        match self.failures.get(&normalize(path)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn authenticate(&mut self, credentials: &StoreCredentials) -> Result<bool, StoreError> {
        self.record(StoreCall::Authenticate {
            role: credentials.role.clone(),
            mount: credentials.mount.clone(),
        });

        let jwt = credentials.jwt.expose();
        self.authenticated = match &self.accepted_jwt {
            Some(accepted) => accepted == jwt,
            None => !jwt.is_empty(),
        };
        Ok(self.authenticated)
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.record(StoreCall::List(path.to_string()));
        self.check_access(path)?;

        let prefix = normalize(path);
        let children: BTreeSet<String> = self
            .records
            .keys()
            .chain(self.metadata_only.iter())
            .filter_map(|stored| stored.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty())
            .map(|rest| match rest.find('/') {
                Some(idx) => rest[..=idx].to_string(),
                None => rest.to_string(),
            })
            .collect();

        if children.is_empty() {
            return Err(StoreError::NoData { path: path.to_string() });
        }
        Ok(children.into_iter().collect())
    }

    async fn read_record(&self, path: &str) -> Result<StoreRecord, StoreError> {
        self.record(StoreCall::Read(path.to_string()));
        self.check_access(path)?;

        self.records
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| StoreError::NoData { path: path.to_string() })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
