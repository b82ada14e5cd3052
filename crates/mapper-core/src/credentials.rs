//! Bearer token source for Vault's Kubernetes auth method
//!
//! Precedence:
//! 1. `VAULT_TOKEN` from the environment
//! 2. The file at `TOKEN_PATH` (defaults to the pod's service account token)

use crate::error::{Error, Result};
use crate::security::SecureString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Service account token mounted into every pod
pub const DEFAULT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Where the bearer token comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Token supplied directly
    Explicit(SecureString),
    /// Token read from a file at load time
    File(PathBuf),
}

impl CredentialSource {
    /// Build a file source, expanding a leading `~`
    pub fn from_path(path: &str) -> Self {
        let expanded = shellexpand::tilde(path);
        CredentialSource::File(PathBuf::from(expanded.as_ref()))
    }

    /// Load the token. The value is treated as opaque apart from trimming
    /// surrounding whitespace from file contents.
    pub fn load(&self) -> Result<SecureString> {
        match self {
            CredentialSource::Explicit(token) => {
                info!("VAULT_TOKEN found in environment variables, using it for auth");
                if token.is_empty() {
                    return Err(Error::EmptyToken {
                        origin: "VAULT_TOKEN".to_string(),
                    });
                }
                Ok(token.clone())
            }
            CredentialSource::File(path) => {
                warn!("Using Vault TOKEN_PATH: {}", path.display());
                read_token_file(path)
            }
        }
    }
}

fn read_token_file(path: &Path) -> Result<SecureString> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::TokenRead {
        path: path.to_path_buf(),
        source,
    })?;
    let token = SecureString::new(raw.trim());
    if token.is_empty() {
        return Err(Error::EmptyToken {
            origin: path.display().to_string(),
        });
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_explicit_token_is_returned() {
        let source = CredentialSource::Explicit(SecureString::from("explicit-jwt"));
        assert_eq!(source.load().unwrap().expose(), "explicit-jwt");
    }

    #[test]
    fn test_file_token_is_trimmed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  file-jwt  ").unwrap();

        let source = CredentialSource::File(file.path().to_path_buf());
        assert_eq!(source.load().unwrap().expose(), "file-jwt");
    }

    #[test]
    fn test_missing_token_file() {
        let source = CredentialSource::File(PathBuf::from("/nonexistent/dir/token"));
        let err = source.load().unwrap_err();
        assert!(matches!(err, Error::TokenRead { .. }));
        assert!(err.to_string().contains("/nonexistent/dir/token"));
    }

    #[test]
    fn test_empty_token_file() {
        let file = NamedTempFile::new().unwrap();
        let source = CredentialSource::File(file.path().to_path_buf());
        assert!(matches!(source.load(), Err(Error::EmptyToken { .. })));
    }

    #[test]
    fn test_from_path_expands_tilde() {
        let source = CredentialSource::from_path("~/token");
        match source {
            CredentialSource::File(path) => assert!(!path.starts_with("~")),
            CredentialSource::Explicit(_) => panic!("Expected file source"),
        }
    }
}
