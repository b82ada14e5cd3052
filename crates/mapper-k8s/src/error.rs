//! Error types for Kubernetes operations

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur while writing the destination Secret.
#[derive(Error, Debug)]
pub enum K8sError {
    #[error("Could not load Kubernetes configuration: {message}")]
    Config { message: String },

    #[error("K8s API error: {message}")]
    Api { message: String },

    #[error("Namespace not found: {name}")]
    NamespaceNotFound { name: String },
}

impl From<kube::Error> for K8sError {
    fn from(err: kube::Error) -> Self {
        K8sError::Api {
            message: err.to_string(),
        }
    }
}
