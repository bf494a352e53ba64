//! Alert message contract shared by all channels.

use serde::{Deserialize, Serialize};

/// Placeholder for labels the alert did not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// One alert item, flattened to the fields a chat message shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Upstream status ("firing", "resolved", ...)
    pub status: String,
    /// Priority label, `N/A` when absent
    pub priority: String,
    /// Pod the alert refers to
    pub pod: String,
    /// Namespace the alert refers to
    pub namespace: String,
    /// Human-readable description annotation
    pub description: String,
    /// Enrichment output, empty when the alert was not enriched
    pub enriched_data: String,
}

impl AlertMessage {
    /// Check if this message reports a resolved alert.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == "resolved"
    }

    /// Slack attachment color: `good` for resolved alerts, `danger` otherwise.
    #[must_use]
    pub fn color(&self) -> &'static str {
        if self.is_resolved() {
            "good"
        } else {
            "danger"
        }
    }

    /// Render the message body.
    #[must_use]
    pub fn text(&self) -> String {
        format!(
            "Alert: {}\nStatus: {}\nPriority: {}\nPod: {}\nNamespace: {}\nEnriched Data: {}",
            self.description,
            self.status,
            self.priority,
            self.pod,
            self.namespace,
            self.enriched_data
        )
    }
}
