//! `SECRET_SOURCES` mapping parser
//!
//! Entries are comma separated, each of the form:
//!
//! ```text
//! [target:]path[:key]
//! ```
//!
//! The optional `target:` prefix is matched greedily, but only when a
//! non-empty path still follows it. So `name:db/creds` is a target plus a
//! path, while `db/creds:password` is a path plus a key. A path ending in `/`
//! names a directory whose children are all resolved.
//!
//! Paths starting with `/secret` or `secret` have that prefix stripped once,
//! so the KV mount name may be written or left out.

use crate::error::ParseError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<target>\w+):)?(?P<path>[*./\w-]+)(?::(?P<key>[/\w-]+)?)?$")
        .expect("mapping entry regex is valid")
});

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-._a-zA-Z0-9]+$").expect("identifier regex is valid"));

const MOUNT_PREFIX: &str = "/secret";
const MOUNT_PREFIX_BARE: &str = "secret";

/// One parsed source directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    /// Destination key override (or prefix, for directories)
    pub target: Option<String>,
    /// Store path; a trailing `/` marks a directory
    pub path: String,
    /// Field to extract from each record
    pub key: String,
}

impl MappingEntry {
    /// Whether the path should be listed rather than read
    pub fn is_directory(&self) -> bool {
        self.path.ends_with('/')
    }

    /// Text after the last `/` of the path
    pub fn leaf_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[idx + 1..],
            None => &self.path,
        }
    }
}

impl fmt::Display for MappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(target) = &self.target {
            write!(f, "{}:", target)?;
        }
        write!(f, "{}:{}", self.path, self.key)
    }
}

/// Whether `name` can be used as a key in the destination Secret
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Parse a full mapping string, preserving entry order
pub fn parse_sources(sources: &str, default_key: &str) -> Result<Vec<MappingEntry>, ParseError> {
    sources
        .split(',')
        .map(|entry| parse_entry(entry, default_key))
        .collect()
}

/// Parse a single comma-free entry
pub fn parse_entry(raw: &str, default_key: &str) -> Result<MappingEntry, ParseError> {
    let entry = raw.trim();

    let Some(caps) = ENTRY_RE.captures(entry) else {
        return Err(classify_mismatch(entry));
    };

    let path = caps
        .name("path")
        .map(|m| m.as_str())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ParseError::MissingPath {
            entry: entry.to_string(),
        })?;

    let target = caps.name("target").map(|m| m.as_str().to_string());
    if let Some(target) = &target {
        if !is_valid_identifier(target) {
            return Err(ParseError::InvalidTarget {
                target: target.clone(),
                entry: entry.to_string(),
            });
        }
    }

    let key = caps
        .name("key")
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| default_key.to_string());

    Ok(MappingEntry {
        target,
        path: strip_mount_prefix(path),
        key,
    })
}

fn strip_mount_prefix(path: &str) -> String {
    if let Some(rest) = path.strip_prefix(MOUNT_PREFIX) {
        debug!("Stripping leading /secret path for {}", path);
        rest.to_string()
    } else if let Some(rest) = path.strip_prefix(MOUNT_PREFIX_BARE) {
        debug!("Stripping leading secret path for {}", path);
        rest.to_string()
    } else {
        path.to_string()
    }
}

fn classify_mismatch(entry: &str) -> ParseError {
    if entry.is_empty() || entry.starts_with(':') || entry.contains("::") {
        ParseError::MissingPath {
            entry: entry.to_string(),
        }
    } else {
        ParseError::Malformed {
            entry: entry.to_string(),
        }
    }
}
