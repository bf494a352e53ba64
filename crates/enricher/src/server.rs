//! HTTP server for the alert webhook.
//!
//! Provides REST API endpoints for:
//! - Receiving Alertmanager batches
//! - Reading the alert counters
//! - Health checks

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::alert::AlertBatch;
use crate::metrics::AlertMetrics;
use crate::processor::AlertBatchProcessor;

/// Server state shared across handlers.
pub struct ServerState {
    /// Batch processor
    pub processor: AlertBatchProcessor,
    /// Counters served on `/metrics`
    pub metrics: Arc<AlertMetrics>,
}

impl ServerState {
    pub fn new(processor: AlertBatchProcessor) -> Self {
        let metrics = processor.metrics();
        Self { processor, metrics }
    }
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/alert", post(alert_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the address.
pub async fn run_server(state: Arc<ServerState>, addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Alert enricher listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum ResponseStatus {
    Success,
    Failure,
}

#[derive(Debug, Serialize)]
struct AlertResponse {
    status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn alert_handler(
    State(state): State<Arc<ServerState>>,
    Json(batch): Json<AlertBatch>,
) -> impl IntoResponse {
    info!(alerts = batch.alerts.len(), "Received alert batch");

    match state.processor.process(batch).await {
        Ok(report) => {
            info!(
                resolved = report.resolved,
                active = report.active,
                "Alert batch processed"
            );
            (
                StatusCode::OK,
                Json(AlertResponse {
                    status: ResponseStatus::Success,
                    error: None,
                }),
            )
        }
        Err(e) => {
            error!(error = %e, "Alert batch processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AlertResponse {
                    status: ResponseStatus::Failure,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
