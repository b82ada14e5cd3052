//! Error types for mapper-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using mapper-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and credential errors, all fatal before any secret is fetched
#[derive(Error, Debug)]
pub enum Error {
    /// Required environment variable missing or empty
    #[error("Required variable {name} not found in environment variables")]
    MissingEnv { name: String },

    /// Environment variable present but unusable
    #[error("Invalid value for {name}: {message}")]
    InvalidEnv { name: String, message: String },

    /// Could not read the token file
    #[error("Could not open token file {}: {source}", path.display())]
    TokenRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token source produced nothing usable
    #[error("Token from {origin} is empty")]
    EmptyToken { origin: String },

    /// Failed to load a .env file
    #[error("Failed to load env file {}: {message}", path.display())]
    EnvFile { path: PathBuf, message: String },
}

impl Error {
    /// Create a missing environment variable error
    pub fn missing_env(name: impl Into<String>) -> Self {
        Self::MissingEnv { name: name.into() }
    }

    /// Create an invalid environment variable error
    pub fn invalid_env(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnv {
            name: name.into(),
            message: message.into(),
        }
    }
}
