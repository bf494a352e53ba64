//! Alert enrichment webhook.
//!
//! Receives Alertmanager batches, enriches active alerts with diagnostic or
//! remediation output, and forwards every alert to a chat channel.
//!
//! - Resolved alerts are forwarded as-is
//! - Active alerts go through the [`EnrichmentRegistry`], keyed by `alertname`
//! - `ImagePullError` alerts roll the owning Deployment to the newest tagged
//!   image in the registry
//!
//! Enrichment never fails a batch. Only delivery failures reach the caller.

pub mod alert;
pub mod cluster;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod metrics;
pub mod processor;
pub mod registry;
pub mod server;

pub use alert::{AlertBatch, AlertItem};
pub use cluster::{ClusterClient, KubeClusterClient};
pub use config::{Config, LogFormat};
pub use enrichment::{
    EnrichmentHandler, EnrichmentOutcome, EnrichmentRegistry, ImagePullRemediationHandler,
    DEFAULT_ENRICHED_DATA,
};
pub use error::{ClusterError, EnrichmentError, RegistryError};
pub use metrics::{AlertMetrics, MetricsSnapshot};
pub use processor::{AlertBatchProcessor, BatchReport};
pub use registry::{EcrClient, EcrConfig, ImageRegistry};
pub use server::{build_router, run_server, ServerState};
