//! Core types for secret resolution

use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Raw secret bytes, zeroed on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(Vec<u8>);

impl SecretValue {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        SecretValue(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED {} bytes])", self.len())
    }
}

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        SecretValue::new(s.as_bytes())
    }
}

/// Destination key name to secret value. Last insert for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretBundle {
    entries: BTreeMap<String, SecretValue>,
}

impl SecretBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: SecretValue) -> Option<SecretValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&SecretValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, SecretValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a SecretBundle {
    type Item = (&'a String, &'a SecretValue);
    type IntoIter = btree_map::Iter<'a, String, SecretValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Fields of one record as returned by the store. Read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRecord {
    fields: HashMap<String, Value>,
}

impl StoreRecord {
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a record from string fields
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        }
    }

    /// Bytes of field `key`. Strings yield their UTF-8 bytes, other JSON
    /// values their compact JSON text. `null` is treated as absent.
    pub fn value(&self, key: &str) -> Option<SecretValue> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(SecretValue::new(s.as_bytes())),
            other => Some(SecretValue::new(other.to_string())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A unit of work skipped without failing the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// Listed item name unusable as a destination key
    InvalidName { path: String, name: String },
    /// Listed item has metadata but no data
    NoData { path: String },
    /// Record lacks the requested field
    MissingKey { path: String, key: String },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionWarning::InvalidName { path, name } => {
                write!(f, "'{}' under {} is not a valid Secret key", name, path)
            }
            ResolutionWarning::NoData { path } => {
                write!(f, "{} metadata exists but contains no data", path)
            }
            ResolutionWarning::MissingKey { path, key } => {
                write!(f, "{} missing key {}", path, key)
            }
        }
    }
}

/// Result of a completed resolution run
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub bundle: SecretBundle,
    pub warnings: Vec<ResolutionWarning>,
}

impl Resolution {
    pub fn warn(&mut self, warning: ResolutionWarning) {
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_value_debug_is_redacted() {
        let value = SecretValue::from("hunter2");
        let debug_str = format!("{:?}", value);
        assert!(debug_str.contains("REDACTED 7 bytes"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_bundle_last_insert_wins() {
        let mut bundle = SecretBundle::new();
        assert!(bundle.insert("DB_URL", SecretValue::from("first")).is_none());
        let replaced = bundle.insert("DB_URL", SecretValue::from("second"));

        assert_eq!(replaced, Some(SecretValue::from("first")));
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.get("DB_URL").unwrap().as_bytes(), b"second");
    }

    #[test]
    fn test_record_value_conversion() {
        let fields = HashMap::from([
            ("password".to_string(), json!("s3cr3t")),
            ("port".to_string(), json!(5432)),
            ("enabled".to_string(), json!(true)),
            ("nothing".to_string(), Value::Null),
        ]);
        let record = StoreRecord::new(fields);

        assert_eq!(record.value("password").unwrap().as_bytes(), b"s3cr3t");
        assert_eq!(record.value("port").unwrap().as_bytes(), b"5432");
        assert_eq!(record.value("enabled").unwrap().as_bytes(), b"true");
        assert!(record.value("nothing").is_none());
        assert!(!record.contains("missing"));
    }

    #[test]
    fn test_warning_display() {
        let warning = ResolutionWarning::MissingKey {
            path: "/apps/db".to_string(),
            key: "password".to_string(),
        };
        assert_eq!(warning.to_string(), "/apps/db missing key password");
    }
}
