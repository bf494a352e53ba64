//! Error types for alert delivery.

use std::fmt;

use thiserror::Error;

/// A single alert that the channel refused or could not reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Description of the alert that failed
    pub description: String,
    /// HTTP status returned by the channel, if a response arrived at all
    pub status: Option<u16>,
    /// Response body or transport error text
    pub detail: String,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "Alert: {} returned an error {status}:\n{}",
                self.description, self.detail
            ),
            None => write!(
                f,
                "Alert: {} could not be sent:\n{}",
                self.description, self.detail
            ),
        }
    }
}

/// Errors that can occur when delivering alerts to a channel.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// One or more alerts in the group were not accepted.
    ///
    /// Alerts delivered before or after a failure are not rolled back.
    #[error("Some requests to {channel} failed:\n{}", render_failures(.failures))]
    Rejected {
        /// Display name of the channel
        channel: &'static str,
        /// Every failed alert, in delivery order
        failures: Vec<DeliveryFailure>,
    },
}

impl DeliveryError {
    /// Failed alerts carried by this error (empty when nothing was attempted).
    #[must_use]
    pub fn failures(&self) -> &[DeliveryFailure] {
        match self {
            Self::NotConfigured(_) => &[],
            Self::Rejected { failures, .. } => failures,
        }
    }
}

fn render_failures(failures: &[DeliveryFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_lists_every_failure() {
        let err = DeliveryError::Rejected {
            channel: "Slack",
            failures: vec![
                DeliveryFailure {
                    description: "disk full".to_string(),
                    status: Some(500),
                    detail: "internal_error".to_string(),
                },
                DeliveryFailure {
                    description: "pod crash".to_string(),
                    status: None,
                    detail: "connection refused".to_string(),
                },
            ],
        };

        let message = err.to_string();
        assert!(message.starts_with("Some requests to Slack failed:\n"));
        assert!(message.contains("Alert: disk full returned an error 500:\ninternal_error"));
        assert!(message.contains("Alert: pod crash could not be sent:\nconnection refused"));
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn test_not_configured_has_no_failures() {
        let err = DeliveryError::NotConfigured("SLACK_WEBHOOK_URL".to_string());
        assert!(err.failures().is_empty());
        assert_eq!(err.to_string(), "Channel not configured: SLACK_WEBHOOK_URL");
    }
}
