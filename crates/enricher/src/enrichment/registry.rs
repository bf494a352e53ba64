//! Alert-type to handler dispatch.

use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::image_pull::{self, ImagePullRemediationHandler};
use super::{EnrichmentHandler, DEFAULT_ENRICHED_DATA};
use crate::alert::AlertItem;
use crate::cluster::ClusterClient;
use crate::error::EnrichmentError;
use crate::registry::ImageRegistry;

/// Builds a handler for one alert. Runs once per alert item.
pub type HandlerFactory =
    Arc<dyn Fn() -> anyhow::Result<Arc<dyn EnrichmentHandler>> + Send + Sync>;

/// Maps alert names to handler factories.
#[derive(Default, Clone)]
pub struct EnrichmentRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl EnrichmentRegistry {
    /// Create an empty registry. Every alert gets default enrichment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in handlers.
    #[must_use]
    pub fn with_defaults(cluster: Arc<dyn ClusterClient>, registry: Arc<dyn ImageRegistry>) -> Self {
        let mut enrichment = Self::new();
        enrichment.register(image_pull::ALERT_NAME, move || {
            Ok(Arc::new(ImagePullRemediationHandler::new(
                Arc::clone(&cluster),
                Arc::clone(&registry),
            )) as Arc<dyn EnrichmentHandler>)
        });
        enrichment
    }

    /// Register a factory for an alert name, replacing any previous one.
    pub fn register<F>(&mut self, alertname: impl Into<String>, factory: F)
    where
        F: Fn() -> anyhow::Result<Arc<dyn EnrichmentHandler>> + Send + Sync + 'static,
    {
        self.factories.insert(alertname.into(), Arc::new(factory));
    }

    /// Register an already-built handler for an alert name.
    pub fn register_handler(
        &mut self,
        alertname: impl Into<String>,
        handler: Arc<dyn EnrichmentHandler>,
    ) {
        self.register(alertname, move || Ok(Arc::clone(&handler)));
    }

    /// Alert names with a registered handler, sorted.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the handler for an alert.
    pub fn resolve(&self, alert: &AlertItem) -> Result<Arc<dyn EnrichmentHandler>, EnrichmentError> {
        let alertname = alert.alertname().ok_or(EnrichmentError::MissingAlertName)?;
        let factory = self
            .factories
            .get(alertname)
            .ok_or_else(|| EnrichmentError::NoHandler(alertname.to_string()))?;

        let construction_failed = |reason: String| EnrichmentError::HandlerConstruction {
            alertname: alertname.to_string(),
            reason,
        };

        match std::panic::catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(Ok(handler)) => Ok(handler),
            Ok(Err(e)) => Err(construction_failed(format!("{e:#}"))),
            Err(panic) => Err(construction_failed(panic_message(panic.as_ref()))),
        }
    }

    /// Enrich one alert in place.
    ///
    /// Always sets `enriched_data`; failures are logged and replaced with
    /// [`DEFAULT_ENRICHED_DATA`].
    pub async fn enrich(&self, alert: &mut AlertItem) {
        let enriched = match self.try_enrich(alert).await {
            Ok(enriched) => enriched,
            Err(EnrichmentError::NoHandler(alertname)) => {
                warn!(
                    alertname = %alertname,
                    "No enrichment handler for alertname, using default enrichment"
                );
                DEFAULT_ENRICHED_DATA.to_string()
            }
            Err(e) => {
                error!(
                    alertname = alert.alertname().unwrap_or("unknown"),
                    error = %e,
                    "Error enriching alert, using default enrichment"
                );
                DEFAULT_ENRICHED_DATA.to_string()
            }
        };

        alert.enriched_data = Some(enriched);
    }

    /// Enrich every alert in order.
    pub async fn enrich_all(&self, alerts: &mut [AlertItem]) {
        for alert in alerts.iter_mut() {
            self.enrich(alert).await;
        }
    }

    async fn try_enrich(&self, alert: &AlertItem) -> Result<String, EnrichmentError> {
        let handler = self.resolve(alert)?;
        debug!(handler = handler.name(), alertname = ?alert.alertname(), "Enriching alert");

        let outcome = AssertUnwindSafe(handler.enrich(alert))
            .catch_unwind()
            .await
            .map_err(|panic| EnrichmentError::HandlerPanicked(panic_message(panic.as_ref())))??;

        outcome
            .render()
            .map_err(|e| EnrichmentError::HandlerFailed(e.to_string()))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
