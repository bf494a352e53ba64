//! Alert enrichment.
//!
//! Handlers attach diagnostic or remediation output to an alert before it is
//! delivered. They are looked up by the alert's `alertname` label in an
//! [`EnrichmentRegistry`] populated at startup. Enrichment never fails from
//! the caller's point of view: anything that goes wrong yields
//! [`DEFAULT_ENRICHED_DATA`] instead.

pub mod image_pull;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alert::AlertItem;
use crate::error::EnrichmentError;

pub use image_pull::ImagePullRemediationHandler;
pub use registry::{EnrichmentRegistry, HandlerFactory};

/// Enrichment recorded when no handler could produce anything better.
pub const DEFAULT_ENRICHED_DATA: &str = "Default enriched data";

/// Trait for alert enrichment handlers.
#[async_trait]
pub trait EnrichmentHandler: Send + Sync {
    /// Get the name of this handler.
    fn name(&self) -> &'static str;

    /// Produce enrichment for one alert.
    async fn enrich(&self, alert: &AlertItem) -> Result<EnrichmentOutcome, EnrichmentError>;
}

/// What a handler found out or did about an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentOutcome {
    /// Where to read about this kind of failure
    pub documentation_link: String,
    /// What an operator should check, or why enrichment stopped early
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    /// What remediation did, if it ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken_summary: Option<String>,
}

impl EnrichmentOutcome {
    /// Create an outcome with only a documentation link.
    #[must_use]
    pub fn new(documentation_link: impl Into<String>) -> Self {
        Self {
            documentation_link: documentation_link.into(),
            ..Self::default()
        }
    }

    /// Render as the alert's `enriched_data` text (pretty-printed JSON).
    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
