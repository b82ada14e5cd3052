//! Environment-driven configuration
//!
//! Everything the job needs comes from environment variables. Lookups go
//! through a caller-supplied function so tests can pass a plain map instead
//! of mutating the process environment.

use crate::credentials::{CredentialSource, DEFAULT_TOKEN_PATH};
use crate::error::{Error, Result};
use crate::security::SecureString;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Required variables, checked in this order
pub const REQUIRED_VARS: [&str; 6] = [
    "NAMESPACE",
    "VAULT_ADDRESS",
    "VAULT_ROLE",
    "VAULT_AUTH_PATH",
    "SECRET_TARGET",
    "SECRET_SOURCES",
];

pub const DEFAULT_KEY: &str = "value";
pub const DEFAULT_KV_MOUNT: &str = "secret";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Full job configuration
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Namespace of the destination Secret
    pub namespace: String,
    /// Name of the destination Secret
    pub secret_target: String,
    /// Raw `SECRET_SOURCES` mapping string
    pub secret_sources: String,
    /// Field used when a mapping entry has no `:key`
    pub default_key: String,
    pub vault: VaultSettings,
    pub credentials: CredentialSource,
}

/// Connection and auth settings for Vault
#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub address: String,
    /// Role for the Kubernetes auth method
    pub role: String,
    /// Mount path of the Kubernetes auth method
    pub auth_path: String,
    /// Mount of the KV v2 engine
    pub kv_mount: String,
    pub namespace: Option<String>,
    pub timeout: Duration,
    pub insecure_skip_verify: bool,
    pub retry: RetryConfig,
}

/// Backoff policy for transport failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl VaultSettings {
    /// Settings pointing at `address` with defaults for everything optional
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            role: String::new(),
            auth_path: String::new(),
            kv_mount: DEFAULT_KV_MOUNT.to_string(),
            namespace: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            insecure_skip_verify: false,
            retry: RetryConfig::default(),
        }
    }
}

impl MapperConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration, first pulling in `env_file` if given or a `.env`
    /// file from the working directory if one exists.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) => Self::from_env_file(path),
            None => {
                if let Ok(path) = dotenvy::dotenv() {
                    debug!("Loaded environment from {}", path.display());
                }
                Self::from_env()
            }
        }
    }

    /// Load a `.env` file into the process environment, then read it.
    /// Variables already set in the environment take precedence.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        dotenvy::from_path(path).map_err(|e| Error::EnvFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_env()
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| get(name).ok_or_else(|| Error::missing_env(name));

        // Report the first missing variable in declaration order
        for name in REQUIRED_VARS {
            require(name)?;
        }

        let timeout = match get("VAULT_TIMEOUT") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                Error::invalid_env("VAULT_TIMEOUT", format!("'{}' is not a number of seconds", raw))
            })?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let mut retry = RetryConfig::default();
        if let Some(raw) = get("VAULT_MAX_RETRIES") {
            retry.max_attempts = raw.trim().parse().map_err(|_| {
                Error::invalid_env("VAULT_MAX_RETRIES", format!("'{}' is not a count", raw))
            })?;
        }

        let insecure_skip_verify = get("VAULT_SKIP_VERIFY")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let credentials = match lookup("VAULT_TOKEN") {
            Some(token) => CredentialSource::Explicit(SecureString::new(token)),
            None => CredentialSource::from_path(
                &get("TOKEN_PATH").unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string()),
            ),
        };

        let config = Self {
            namespace: require("NAMESPACE")?,
            secret_target: require("SECRET_TARGET")?,
            secret_sources: require("SECRET_SOURCES")?,
            default_key: get("DEFAULT_KEY").unwrap_or_else(|| DEFAULT_KEY.to_string()),
            vault: VaultSettings {
                address: require("VAULT_ADDRESS")?,
                role: require("VAULT_ROLE")?,
                auth_path: require("VAULT_AUTH_PATH")?,
                kv_mount: get("VAULT_KV_MOUNT").unwrap_or_else(|| DEFAULT_KV_MOUNT.to_string()),
                namespace: get("VAULT_NAMESPACE"),
                timeout,
                insecure_skip_verify,
                retry,
            },
            credentials,
        };

        debug!(
            namespace = %config.namespace,
            target = %config.secret_target,
            vault = %config.vault.address,
            "Loaded configuration"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("NAMESPACE", "apps"),
            ("VAULT_ADDRESS", "https://vault.example.com"),
            ("VAULT_ROLE", "mapper"),
            ("VAULT_AUTH_PATH", "kubernetes"),
            ("SECRET_TARGET", "app-secrets"),
            ("SECRET_SOURCES", "db/:password"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<MapperConfig> {
        MapperConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_required_and_defaults() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.namespace, "apps");
        assert_eq!(config.secret_target, "app-secrets");
        assert_eq!(config.secret_sources, "db/:password");
        assert_eq!(config.default_key, "value");
        assert_eq!(config.vault.address, "https://vault.example.com");
        assert_eq!(config.vault.role, "mapper");
        assert_eq!(config.vault.auth_path, "kubernetes");
        assert_eq!(config.vault.kv_mount, "secret");
        assert_eq!(config.vault.timeout, Duration::from_secs(30));
        assert!(!config.vault.insecure_skip_verify);
        assert_eq!(
            config.credentials,
            CredentialSource::File(DEFAULT_TOKEN_PATH.into())
        );
    }

    #[test]
    fn test_first_missing_variable_is_reported() {
        let mut env = base_env();
        env.remove("VAULT_ROLE");
        env.remove("SECRET_SOURCES");

        let err = load(&env).unwrap_err();
        assert!(matches!(err, Error::MissingEnv { ref name } if name == "VAULT_ROLE"));
    }

    #[test]
    fn test_empty_required_variable_counts_as_missing() {
        let mut env = base_env();
        env.insert("NAMESPACE", "   ");

        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("NAMESPACE"));
    }

    #[test]
    fn test_optional_overrides() {
        let mut env = base_env();
        env.insert("DEFAULT_KEY", "password");
        env.insert("VAULT_KV_MOUNT", "kv");
        env.insert("VAULT_NAMESPACE", "team-a");
        env.insert("VAULT_TIMEOUT", "5");
        env.insert("VAULT_SKIP_VERIFY", "1");
        env.insert("VAULT_MAX_RETRIES", "0");
        env.insert("VAULT_TOKEN", "jwt");

        let config = load(&env).unwrap();
        assert_eq!(config.default_key, "password");
        assert_eq!(config.vault.kv_mount, "kv");
        assert_eq!(config.vault.namespace.as_deref(), Some("team-a"));
        assert_eq!(config.vault.timeout, Duration::from_secs(5));
        assert!(config.vault.insecure_skip_verify);
        assert_eq!(config.vault.retry.max_attempts, 0);
        assert_eq!(
            config.credentials,
            CredentialSource::Explicit(SecureString::from("jwt"))
        );
    }

    #[test]
    fn test_token_path_override() {
        let mut env = base_env();
        env.insert("TOKEN_PATH", "/tmp/sa-token");

        let config = load(&env).unwrap();
        assert_eq!(
            config.credentials,
            CredentialSource::File("/tmp/sa-token".into())
        );
    }

    #[test]
    fn test_invalid_timeout() {
        let mut env = base_env();
        env.insert("VAULT_TIMEOUT", "soon");

        let err = load(&env).unwrap_err();
        assert!(matches!(err, Error::InvalidEnv { ref name, .. } if name == "VAULT_TIMEOUT"));
    }

    #[test]
    #[serial]
    fn test_from_env_file_fills_missing_variables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (key, value) in base_env() {
            writeln!(file, "{}={}", key, value).unwrap();
        }
        std::env::set_var("NAMESPACE", "from-shell");

        let config = MapperConfig::from_env_file(file.path()).unwrap();
        assert_eq!(config.namespace, "from-shell");
        assert_eq!(config.secret_target, "app-secrets");

        for (key, _) in base_env() {
            std::env::remove_var(key);
        }
    }
}
