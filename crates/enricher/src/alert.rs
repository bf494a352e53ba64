//! Alert data model (Alertmanager webhook payload).

use chrono::{DateTime, Utc};
use notify::{AlertMessage, NOT_AVAILABLE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::EnrichmentError;

/// Status value Alertmanager uses for alerts that stopped firing.
pub const STATUS_RESOLVED: &str = "resolved";

/// Alertmanager webhook payload.
///
/// Reference: <https://prometheus.io/docs/alerting/latest/configuration/#webhook_config>
///
/// Only `alerts` is required; the envelope fields default when absent so
/// hand-written batches are accepted too.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBatch {
    /// Version of the payload format
    #[serde(default)]
    pub version: String,
    /// Unique identifier for this group of alerts
    #[serde(default)]
    pub group_key: String,
    /// Status of the group: "firing" or "resolved"
    #[serde(default)]
    pub status: String,
    /// Receiver that matched this alert
    #[serde(default)]
    pub receiver: String,
    /// Labels common to all alerts in this group
    #[serde(default)]
    pub group_labels: HashMap<String, String>,
    /// Labels common to all alerts (may include group labels)
    #[serde(default)]
    pub common_labels: HashMap<String, String>,
    /// Annotations common to all alerts
    #[serde(default)]
    pub common_annotations: HashMap<String, String>,
    /// External URL for Alertmanager
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
    /// Alerts in this notification, in upstream order
    pub alerts: Vec<AlertItem>,
}

impl AlertBatch {
    /// Create a batch holding only the given alerts.
    #[must_use]
    pub fn new(alerts: Vec<AlertItem>) -> Self {
        Self {
            alerts,
            ..Self::default()
        }
    }
}

/// Individual alert from Alertmanager.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    /// Status: "firing" or "resolved". Set upstream, never altered here.
    pub status: String,
    /// Alert labels
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Alert annotations
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// When the alert started firing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    /// When the alert was resolved (if resolved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// URL to the alert source
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
    /// Unique fingerprint for this alert
    #[serde(default)]
    pub fingerprint: String,
    /// Output of enrichment; absent until enrichment runs
    #[serde(
        default,
        rename = "enriched_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub enriched_data: Option<String>,
}

impl AlertItem {
    /// Create an alert with the given status and labels.
    #[must_use]
    pub fn new<I, K, V>(status: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            status: status.to_string(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Set an annotation, returning the alert.
    #[must_use]
    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }

    /// Get a label value.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Get a label that enrichment cannot proceed without.
    pub fn required_label(&self, key: &'static str) -> Result<&str, EnrichmentError> {
        self.label(key).ok_or(EnrichmentError::MissingLabel(key))
    }

    /// Get the alert name (the enrichment dispatch key).
    #[must_use]
    pub fn alertname(&self) -> Option<&str> {
        self.label("alertname")
    }

    /// Get the namespace label.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.label("namespace")
    }

    /// Get the pod label.
    #[must_use]
    pub fn pod(&self) -> Option<&str> {
        self.label("pod")
    }

    /// Get the container label.
    #[must_use]
    pub fn container(&self) -> Option<&str> {
        self.label("container")
    }

    /// Get the priority label, `N/A` when absent.
    #[must_use]
    pub fn priority(&self) -> &str {
        self.label("priority").unwrap_or(NOT_AVAILABLE)
    }

    /// Get the description annotation.
    #[must_use]
    pub fn description(&self) -> &str {
        self.annotations
            .get("description")
            .map_or("No description", String::as_str)
    }

    /// Check if this alert has been resolved upstream.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == STATUS_RESOLVED
    }

    /// Build the chat message for this alert.
    #[must_use]
    pub fn to_message(&self) -> AlertMessage {
        AlertMessage {
            status: self.status.clone(),
            priority: self.priority().to_string(),
            pod: self.pod().unwrap_or(NOT_AVAILABLE).to_string(),
            namespace: self.namespace().unwrap_or(NOT_AVAILABLE).to_string(),
            description: self.description().to_string(),
            enriched_data: self.enriched_data.clone().unwrap_or_default(),
        }
    }
}
