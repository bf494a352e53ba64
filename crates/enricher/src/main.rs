//! Alert enricher binary.
//!
//! Standalone HTTP service for Alertmanager webhook handling.

use anyhow::{Context, Result};
use clap::Parser;
use notify::{NotifyChannel, SlackChannel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use enricher::{
    AlertBatchProcessor, AlertMetrics, ClusterClient, Config, EcrClient, EnrichmentRegistry,
    ImageRegistry, KubeClusterClient, LogFormat, ServerState,
};

const DEFAULT_LOG_FILTER: &str = "enricher=info,notify=info,kube=warn,hyper=warn,reqwest=warn";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    init_tracing(config.log_format)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting alert enricher...");

    // Initialize Kubernetes client
    let kube_client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let cluster: Arc<dyn ClusterClient> = Arc::new(KubeClusterClient::new(kube_client));

    // Initialize registry client (default AWS credential chain)
    let ecr_config = config.ecr();
    let registry: Arc<dyn ImageRegistry> = Arc::new(EcrClient::load(&ecr_config).await);
    info!(region = %ecr_config.region, "ECR client configured");

    let enrichment = EnrichmentRegistry::with_defaults(cluster, registry);
    info!(handlers = ?enrichment.handler_names(), "Enrichment handlers registered");

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let slack = SlackChannel::with_client(config.slack_webhook_url.clone(), http_client);
    if !slack.enabled() {
        warn!("No SLACK_WEBHOOK_URL configured - alert delivery will fail");
    }

    let processor =
        AlertBatchProcessor::new(enrichment, Arc::new(slack), Arc::new(AlertMetrics::new()));
    let state = Arc::new(ServerState::new(processor));

    enricher::run_server(state, &config.addr)
        .await
        .context("Server error")?;

    Ok(())
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Invalid log filter")?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }

    Ok(())
}
