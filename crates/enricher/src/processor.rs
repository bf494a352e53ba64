//! Batch processing: split, enrich, deliver, count.

use notify::{AlertMessage, DeliveryError, NotifyChannel};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::alert::{AlertBatch, AlertItem};
use crate::enrichment::EnrichmentRegistry;
use crate::metrics::AlertMetrics;

/// Number of alerts delivered per group for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub resolved: usize,
    pub active: usize,
}

/// Processes Alertmanager batches end to end.
pub struct AlertBatchProcessor {
    enrichment: EnrichmentRegistry,
    channel: Arc<dyn NotifyChannel>,
    metrics: Arc<AlertMetrics>,
}

impl AlertBatchProcessor {
    pub fn new(
        enrichment: EnrichmentRegistry,
        channel: Arc<dyn NotifyChannel>,
        metrics: Arc<AlertMetrics>,
    ) -> Self {
        Self {
            enrichment,
            channel,
            metrics,
        }
    }

    /// Shared counters, for serving alongside the processor.
    pub fn metrics(&self) -> Arc<AlertMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Process one batch.
    ///
    /// Resolved alerts are delivered as-is; active alerts are enriched first.
    /// A delivery failure charges the whole group to `failed` and stops the
    /// batch. Enrichment failures never do.
    pub async fn process(&self, batch: AlertBatch) -> Result<BatchReport, DeliveryError> {
        self.metrics.record_batch();

        let (resolved, mut active) = split_by_status(batch.alerts);
        debug!(
            resolved = resolved.len(),
            active = active.len(),
            "Split alert batch"
        );

        if !resolved.is_empty() {
            self.deliver_group("resolved", &resolved).await?;
        }

        if !active.is_empty() {
            self.enrichment.enrich_all(&mut active).await;
            self.deliver_group("enriched", &active).await?;
        }

        Ok(BatchReport {
            resolved: resolved.len(),
            active: active.len(),
        })
    }

    async fn deliver_group(&self, group: &str, alerts: &[AlertItem]) -> Result<(), DeliveryError> {
        let messages: Vec<AlertMessage> = alerts.iter().map(AlertItem::to_message).collect();

        match self.channel.deliver(&messages).await {
            Ok(()) => {
                self.metrics.record_delivered(alerts.len());
                info!(
                    group,
                    count = alerts.len(),
                    channel = self.channel.name(),
                    "Delivered alerts"
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failed(alerts.len());
                error!(
                    group,
                    count = alerts.len(),
                    channel = self.channel.name(),
                    error = %e,
                    "Failed to send {group} alerts"
                );
                Err(e)
            }
        }
    }
}

/// Partition into (resolved, active), keeping relative order within each.
pub fn split_by_status(alerts: Vec<AlertItem>) -> (Vec<AlertItem>, Vec<AlertItem>) {
    alerts.into_iter().partition(AlertItem::is_resolved)
}
