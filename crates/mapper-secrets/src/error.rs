//! Error types for mapping and resolution

use thiserror::Error;

/// Malformed `SECRET_SOURCES` entry. Raised before any store interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing path from '{entry}'")]
    MissingPath { entry: String },

    #[error("Target has incompatible characters: '{target}' in '{entry}'")]
    InvalidTarget { target: String, entry: String },

    #[error("Incorrect source configuration '{entry}', should be in form [target:]path[:key]")]
    Malformed { entry: String },
}

/// Failure reported by a secret store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Path metadata exists (or the path is unknown) but there is no readable data
    #[error("Path '{path}' contains no data")]
    NoData { path: String },

    /// The store refused the credentials or token
    #[error("Permission denied: {message}")]
    Unauthorized { message: String },

    /// Request failed for any other reason
    #[error("Request for '{path}' failed: {message}")]
    Backend { path: String, message: String },

    /// The client could not be built
    #[error("Secret store client error: {message}")]
    Client { message: String },
}

/// Fatal resolution failure. No partial bundle is ever returned alongside one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Secret store client failed to authenticate: {message}")]
    Authentication { message: String },

    #[error("Path '{path}' metadata exists but contains no data (source '{entry}')")]
    DanglingReference { path: String, entry: String },

    #[error("Failed to list secrets under '{path}': {source}")]
    List {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to read secret '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: StoreError,
    },
}
