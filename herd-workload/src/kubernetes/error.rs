//! Workload error types
//!
//! Separates malformed input from collaborator failures so callers can
//! decide what to retry.

use crate::kubernetes::types::Workload;
use herd_common::WorkloadKind;
use thiserror::Error;

/// Workload layer errors
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// Identifier is not `<kind>:<namespace>:<name>`
    #[error("workload name [{0}] is invalid")]
    InvalidIdentifier(String),

    /// Ports annotation is not a JSON list of ports
    #[error("malformed ports annotation: {0}")]
    MalformedAnnotation(#[source] serde_json::Error),

    /// Backing resource does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: WorkloadKind,
        namespace: String,
        name: String,
    },

    /// Error from kube-rs client
    #[cfg(feature = "kubernetes")]
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Failure reported by a read, write or enqueue collaborator
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// Failure returned by the sync handler
    #[error("handler error: {0}")]
    Handler(String),
}

impl WorkloadError {
    /// Whether the error means the backing resource is gone
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            #[cfg(feature = "kubernetes")]
            Self::KubeError(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}

impl From<herd_common::Error> for WorkloadError {
    fn from(err: herd_common::Error) -> Self {
        match err {
            herd_common::Error::InvalidIdentifier(id) => Self::InvalidIdentifier(id),
        }
    }
}

/// Result type alias for workload operations
pub type WorkloadResult<T> = std::result::Result<T, WorkloadError>;

/// Listing failed part way through a namespace
///
/// The workloads collected before the failing kind are kept.
#[derive(Debug, Error)]
#[error("listing workloads failed after {} entries: {source}", .workloads.len())]
pub struct PartialListError {
    pub workloads: Vec<Workload>,
    #[source]
    pub source: WorkloadError,
}

impl From<PartialListError> for WorkloadError {
    fn from(err: PartialListError) -> Self {
        err.source
    }
}
