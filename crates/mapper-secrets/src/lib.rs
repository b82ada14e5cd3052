//! Secret resolution for vault-k8s-mapper
//!
//! This crate turns the `SECRET_SOURCES` mapping string into a flat bundle of
//! secret values:
//! - **Mapping parser**: `[target:]path[:key][,...]` into ordered [`MappingEntry`] values
//! - **Resolver**: walks the entries against a [`SecretStore`], listing
//!   directories and reading leaves, folding everything into a [`SecretBundle`]
//! - **Stores**: HashiCorp Vault KV v2 via `vaultrs`, plus an in-memory store

pub mod error;
pub mod mapping;
pub mod resolver;
pub mod store;
pub mod types;

pub use error::{ParseError, ResolveError, StoreError};
pub use mapping::{is_valid_identifier, parse_sources, MappingEntry};
pub use resolver::{resolve_secrets, AuthenticatedResolver, SecretResolver};
pub use store::{MemoryStore, SecretStore, StoreCredentials, VaultStore};
pub use types::{Resolution, ResolutionWarning, SecretBundle, SecretValue, StoreRecord};
