//! Kubernetes Secret writer for vault-k8s-mapper
//!
//! Provides the [`SecretWriter`] seam the sync pipeline hands its finished
//! bundle to, a `kube`-backed implementation, and a dry-run writer.

pub mod error;
pub mod writer;

pub use error::{K8sError, K8sResult};
pub use writer::{build_secret, DryRunWriter, KubeSecretWriter, SecretWriter, WriteOutcome};
