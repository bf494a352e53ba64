//! End-to-end tests for the HTTP surface.

use async_trait::async_trait;
use enricher::{
    AlertBatchProcessor, AlertItem, AlertMetrics, EnrichmentError, EnrichmentHandler,
    EnrichmentOutcome, EnrichmentRegistry, ServerState, DEFAULT_ENRICHED_DATA,
};
use notify::{AlertMessage, DeliveryError, DeliveryFailure, NotifyChannel};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingChannel {
    delivered: Mutex<Vec<AlertMessage>>,
    fail: bool,
}

#[async_trait]
impl NotifyChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "Recording"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn deliver(&self, messages: &[AlertMessage]) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().extend_from_slice(messages);
        if self.fail {
            return Err(DeliveryError::Rejected {
                channel: "Recording",
                failures: messages
                    .iter()
                    .map(|m| DeliveryFailure {
                        description: m.description.clone(),
                        status: Some(404),
                        detail: "no_service".to_string(),
                    })
                    .collect(),
            });
        }
        Ok(())
    }
}

struct DocsHandler;

#[async_trait]
impl EnrichmentHandler for DocsHandler {
    fn name(&self) -> &'static str {
        "docs"
    }

    async fn enrich(&self, alert: &AlertItem) -> Result<EnrichmentOutcome, EnrichmentError> {
        Ok(EnrichmentOutcome {
            suggested_action: Some(format!("Check disk on {}", alert.pod().unwrap_or("?"))),
            ..EnrichmentOutcome::new("https://docs.example/disk")
        })
    }
}

async fn spawn_server(channel: Arc<RecordingChannel>) -> String {
    let mut enrichment = EnrichmentRegistry::new();
    enrichment.register_handler("DiskFull", Arc::new(DocsHandler));

    let processor = AlertBatchProcessor::new(enrichment, channel, Arc::new(AlertMetrics::new()));
    let app = enricher::build_router(Arc::new(ServerState::new(processor)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn alertmanager_payload() -> Value {
    json!({
        "version": "4",
        "status": "firing",
        "receiver": "enricher",
        "alerts": [
            {
                "status": "firing",
                "labels": {"alertname": "DiskFull", "namespace": "shop", "pod": "db-0", "priority": "P2"},
                "annotations": {"description": "Disk almost full"}
            },
            {
                "status": "firing",
                "labels": {"alertname": "HighLatency"},
                "annotations": {}
            },
            {
                "status": "resolved",
                "labels": {"alertname": "DiskFull", "pod": "db-1"},
                "annotations": {"description": "Disk recovered"}
            }
        ]
    })
}

#[tokio::test]
async fn test_alert_batch_is_enriched_and_delivered() {
    let channel = Arc::new(RecordingChannel::default());
    let base = spawn_server(Arc::clone(&channel)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/alert"))
        .json(&alertmanager_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"status": "success"})
    );

    let delivered = channel.delivered.lock().unwrap().clone();
    assert_eq!(delivered.len(), 3);

    // Resolved group goes first, unenriched
    assert_eq!(delivered[0].description, "Disk recovered");
    assert_eq!(delivered[0].enriched_data, "");
    assert_eq!(delivered[0].namespace, "N/A");

    let enriched: Value = serde_json::from_str(&delivered[1].enriched_data).unwrap();
    assert_eq!(enriched["suggested_action"], "Check disk on db-0");
    assert_eq!(delivered[1].priority, "P2");

    assert_eq!(delivered[2].enriched_data, DEFAULT_ENRICHED_DATA);
    assert_eq!(delivered[2].description, "No description");

    let metrics: Value = client
        .get(format!("{base}/metrics"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        metrics,
        json!({"alerts_processed": 1, "alerts_successful": 3, "alerts_failed": 0})
    );
}

#[tokio::test]
async fn test_delivery_failure_returns_500() {
    let channel = Arc::new(RecordingChannel {
        fail: true,
        ..RecordingChannel::default()
    });
    let base = spawn_server(channel).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/alert"))
        .json(&alertmanager_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "failure");
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Some requests to Recording failed:"));
    assert!(error.contains("Alert: Disk recovered returned an error 404"));

    // Resolved group failed first; active alerts were never attempted
    let metrics: Value = client
        .get(format!("{base}/metrics"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        metrics,
        json!({"alerts_processed": 1, "alerts_successful": 0, "alerts_failed": 1})
    );
}

#[tokio::test]
async fn test_health() {
    let base = spawn_server(Arc::new(RecordingChannel::default())).await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_malformed_batch_is_rejected() {
    let channel = Arc::new(RecordingChannel::default());
    let base = spawn_server(Arc::clone(&channel)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/alert"))
        .json(&json!({"receiver": "enricher"}))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(channel.delivered.lock().unwrap().is_empty());
}
