//! Process-lifetime alert counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the batch processor and the HTTP surface.
///
/// `processed` counts batches; `successful` and `failed` count alert items.
#[derive(Debug, Default)]
pub struct AlertMetrics {
    processed: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`AlertMetrics`], as served on `/metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub alerts_processed: u64,
    pub alerts_successful: u64,
    pub alerts_failed: u64,
}

impl AlertMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one processed batch.
    pub fn record_batch(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a delivered group of alerts.
    pub fn record_delivered(&self, count: usize) {
        self.successful.fetch_add(as_count(count), Ordering::Relaxed);
    }

    /// Count a group of alerts whose delivery failed.
    pub fn record_failed(&self, count: usize) {
        self.failed.fetch_add(as_count(count), Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            alerts_processed: self.processed.load(Ordering::Relaxed),
            alerts_successful: self.successful.load(Ordering::Relaxed),
            alerts_failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

fn as_count(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
