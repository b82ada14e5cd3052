//! # mapper-core
//!
//! Core library for vault-k8s-mapper providing:
//! - Configuration read from environment variables (and `.env` files)
//! - The bearer token source used to authenticate against Vault
//! - `SecureString`, a zero-on-drop string for credentials
//! - The shared configuration error type

pub mod config;
pub mod credentials;
pub mod error;
pub mod security;

pub use config::{MapperConfig, RetryConfig, VaultSettings};
pub use credentials::{CredentialSource, DEFAULT_TOKEN_PATH};
pub use error::{Error, Result};
pub use security::SecureString;
