//! Slack webhook notification channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::{DeliveryError, DeliveryFailure};
use crate::message::AlertMessage;
use crate::NotifyChannel;

/// Environment variable for Slack webhook URL.
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Slack webhook notification channel.
pub struct SlackChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a new Slack channel from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let webhook_url = std::env::var(ENV_SLACK_WEBHOOK_URL)
            .ok()
            .filter(|url| !url.is_empty());

        if webhook_url.is_some() {
            debug!("Slack notifications enabled");
        } else {
            debug!("Slack notifications disabled (SLACK_WEBHOOK_URL not set)");
        }

        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    /// Create a Slack channel with a specific webhook URL.
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        Self::with_client(Some(webhook_url), reqwest::Client::new())
    }

    /// Create a Slack channel with a preconfigured HTTP client.
    #[must_use]
    pub fn with_client(webhook_url: Option<String>, client: reqwest::Client) -> Self {
        Self {
            webhook_url: webhook_url.filter(|url| !url.is_empty()),
            client,
        }
    }

    /// Format an alert as a Slack webhook payload.
    fn format_payload(message: &AlertMessage) -> SlackPayload {
        SlackPayload {
            attachments: vec![SlackAttachment {
                color: message.color(),
                text: message.text(),
            }],
        }
    }

    async fn post(&self, webhook_url: &str, message: &AlertMessage) -> Result<(), DeliveryFailure> {
        let payload = Self::format_payload(message);

        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryFailure {
                description: message.description.clone(),
                status: None,
                detail: e.to_string(),
            })?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryFailure {
            description: message.description.clone(),
            status: Some(status.as_u16()),
            detail: body,
        })
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "Slack"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn deliver(&self, messages: &[AlertMessage]) -> Result<(), DeliveryError> {
        let webhook_url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| DeliveryError::NotConfigured(ENV_SLACK_WEBHOOK_URL.to_string()))?;

        let mut failures = Vec::new();

        for message in messages {
            match self.post(webhook_url, message).await {
                Ok(()) => {
                    debug!(channel = "slack", pod = %message.pod, "Alert delivered");
                }
                Err(failure) => {
                    error!(
                        channel = "slack",
                        status = ?failure.status,
                        detail = %failure.detail,
                        "Failed to send alert to Slack"
                    );
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                channel: self.name(),
                failures,
            })
        }
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload {
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    color: &'static str,
    text: String,
}
