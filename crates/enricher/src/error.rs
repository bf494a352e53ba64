//! Error types for enrichment, cluster access, and registry access.
//!
//! None of these cross the enrichment boundary: the dispatcher turns every
//! one of them into a default or descriptive enrichment. Only
//! [`notify::DeliveryError`] reaches callers of batch processing.

use thiserror::Error;

/// Errors raised while resolving or running an enrichment handler.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// A label the handler needs is not on the alert
    #[error("Missing key '{0}' in alert item labels")]
    MissingLabel(&'static str),

    /// The alert carries no `alertname` label to dispatch on
    #[error("Alert has no alertname label")]
    MissingAlertName,

    /// No handler is registered for this alert type
    #[error("No enrichment handler registered for alertname '{0}'")]
    NoHandler(String),

    /// The handler factory failed
    #[error("Failed to construct handler for '{alertname}': {reason}")]
    HandlerConstruction {
        /// Alert type whose handler failed to build
        alertname: String,
        /// Why construction failed
        reason: String,
    },

    /// The handler ran and failed
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    /// The handler panicked while running
    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),
}

/// Errors from the Kubernetes API.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The requested object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        /// Object kind (Pod, ReplicaSet, Deployment)
        kind: &'static str,
        /// Object name
        name: String,
        /// Namespace searched
        namespace: String,
    },

    /// Any other API failure
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),
}

/// Errors from the image registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The repository does not exist in the registry
    #[error("Repository {0} not found in registry")]
    RepositoryNotFound(String),

    /// The registry call failed
    #[error("Registry request failed ({code}): {message}")]
    Api {
        /// Error code reported by the registry, or `Unhandled` for transport failures
        code: String,
        /// Full error chain
        message: String,
    },
}
