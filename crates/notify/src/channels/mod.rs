//! Notification channel implementations.

pub mod slack;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::message::AlertMessage;

/// Trait for notification channels (Slack, etc.).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Deliver a group of alerts, one message per alert.
    ///
    /// Every alert is attempted; failures are collected and reported together
    /// once the whole group has been tried.
    async fn deliver(&self, messages: &[AlertMessage]) -> Result<(), DeliveryError>;
}
