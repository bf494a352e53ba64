//! Image pull failure remediation.
//!
//! When a pod cannot pull its image, redeploy the owning Deployment with the
//! newest tagged image in the same repository:
//!
//! 1. Read the pod and find the failing container's image
//! 2. Follow owner references Pod -> ReplicaSet -> Deployment
//! 3. Pick the most recently pushed tagged image from the registry
//! 4. Patch the Deployment's container to that image
//!
//! Every failure along the way ends remediation quietly; the outcome says
//! what happened but nothing is raised to the dispatcher.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{EnrichmentHandler, EnrichmentOutcome};
use crate::alert::AlertItem;
use crate::cluster::{deployment_container_mut, owners_of_kind, pod_container, ClusterClient};
use crate::error::{ClusterError, EnrichmentError, RegistryError};
use crate::registry::{latest_tagged_image, ImageCoordinates, ImageRegistry};

/// Alert name this handler is registered under.
pub const ALERT_NAME: &str = "ImagePullError";

/// Documentation attached to every image pull enrichment.
pub const DOCUMENTATION_LINK: &str =
    "https://kubernetes.io/docs/concepts/containers/images/#updating-images";

/// Summary when remediation did not patch anything.
pub const NO_ACTION_SUMMARY: &str =
    "No stable or latest image found for the given repository. Deployment patching failed.";

/// Remediates image pull failures by rolling the Deployment to the newest image.
pub struct ImagePullRemediationHandler {
    cluster: Arc<dyn ClusterClient>,
    registry: Arc<dyn ImageRegistry>,
}

impl ImagePullRemediationHandler {
    /// Create a handler over the given cluster and registry.
    #[must_use]
    pub fn new(cluster: Arc<dyn ClusterClient>, registry: Arc<dyn ImageRegistry>) -> Self {
        Self { cluster, registry }
    }

    /// Inspect the alert's pod and try to remediate.
    pub async fn remediate_alert(&self, alert: &AlertItem) -> EnrichmentOutcome {
        let mut outcome = EnrichmentOutcome::new(DOCUMENTATION_LINK);

        let labels = alert.required_label("namespace").and_then(|namespace| {
            let pod = alert.required_label("pod")?;
            let container = alert.required_label("container")?;
            Ok((namespace, pod, container))
        });
        let (namespace, pod_name, container_name) = match labels {
            Ok(labels) => labels,
            Err(e) => {
                warn!(error = %e, "Image pull alert is missing labels");
                outcome.suggested_action = Some(e.to_string());
                return outcome;
            }
        };

        let pod = match self.cluster.read_pod(pod_name, namespace).await {
            Ok(pod) => pod,
            Err(e) => {
                warn!(pod = %pod_name, namespace = %namespace, error = %e, "Failed to read pod");
                outcome.suggested_action = Some(format!(
                    "Failed to read pod {namespace}/{pod_name}: {e}, please check the logs for more details"
                ));
                return outcome;
            }
        };

        let Some(image) = pod_container(&pod, container_name).and_then(|c| c.image.as_deref())
        else {
            debug!(
                pod = %pod_name,
                container = %container_name,
                "Container not found in pod, nothing to remediate"
            );
            outcome.suggested_action = Some(format!(
                "Verify the image of container {container_name}. Ensure the image exists in the registry and the node has access to it."
            ));
            return outcome;
        };

        outcome.suggested_action = Some(format!(
            "Verify the image {image}. Ensure the image exists in the registry and the node has access to it."
        ));

        let summary = match self.remediate(&pod, image, namespace, container_name).await {
            Some(patched) => {
                info!(pod = %pod_name, image = %patched, "Deployment has been updated with a new image");
                format!("Deployment has been updated with a new image - {patched}")
            }
            None => {
                info!(pod = %pod_name, image = %image, "No remediation applied");
                NO_ACTION_SUMMARY.to_string()
            }
        };
        outcome.action_taken_summary = Some(summary);

        outcome
    }

    /// Returns the image the Deployment was patched to, or `None` if no action was taken.
    async fn remediate(
        &self,
        pod: &Pod,
        image: &str,
        namespace: &str,
        container: &str,
    ) -> Option<String> {
        let coordinates = ImageCoordinates::parse(image);

        let deployment = find_owning_deployment(self.cluster.as_ref(), pod, namespace).await?;

        let latest = match latest_tagged_image(self.registry.as_ref(), &coordinates.repository).await
        {
            Ok(Some(latest)) => latest,
            Ok(None) => {
                info!(repository = %coordinates.repository, "Repository has no tagged images");
                return None;
            }
            Err(RegistryError::RepositoryNotFound(repository)) => {
                warn!(repository = %repository, "Repository not found in registry");
                return None;
            }
            Err(e) => {
                error!(repository = %coordinates.repository, error = %e, "Failed to retrieve latest image");
                return None;
            }
        };

        let Some(tag) = latest.primary_tag() else {
            warn!(repository = %coordinates.repository, "Latest image has no tags");
            return None;
        };
        let new_image = coordinates.image_with_tag(tag);

        match self
            .update_deployment_image(&deployment, namespace, container, &new_image)
            .await
        {
            Ok(()) => Some(new_image),
            Err(e) => {
                error!(deployment = %deployment, namespace = %namespace, error = %e, "Failed to patch deployment");
                None
            }
        }
    }

    async fn update_deployment_image(
        &self,
        name: &str,
        namespace: &str,
        container: &str,
        image: &str,
    ) -> Result<(), ClusterError> {
        let mut deployment = self.cluster.read_deployment(name, namespace).await?;

        match deployment_container_mut(&mut deployment, container) {
            Some(target) => target.image = Some(image.to_string()),
            None => warn!(
                deployment = %name,
                container = %container,
                "Container not in deployment template, patch will not change the image"
            ),
        }

        self.cluster
            .patch_deployment(name, namespace, &deployment)
            .await
    }
}

#[async_trait]
impl EnrichmentHandler for ImagePullRemediationHandler {
    fn name(&self) -> &'static str {
        "image-pull-remediation"
    }

    async fn enrich(&self, alert: &AlertItem) -> Result<EnrichmentOutcome, EnrichmentError> {
        Ok(self.remediate_alert(alert).await)
    }
}

/// Follow Pod -> ReplicaSet -> Deployment owner references.
///
/// Every ReplicaSet owner is tried in order until one is owned by a
/// Deployment. Returns `None` if no chain completes or a ReplicaSet cannot be
/// read.
pub async fn find_owning_deployment(
    cluster: &dyn ClusterClient,
    pod: &Pod,
    namespace: &str,
) -> Option<String> {
    for replica_set_name in owners_of_kind(&pod.metadata, "ReplicaSet") {
        let replica_set = match cluster.read_replica_set(replica_set_name, namespace).await {
            Ok(replica_set) => replica_set,
            Err(e) => {
                warn!(replica_set = %replica_set_name, error = %e, "Failed to retrieve deployment name");
                return None;
            }
        };

        if let Some(deployment) = owners_of_kind(&replica_set.metadata, "Deployment").next() {
            return Some(deployment.to_string());
        }
        debug!(replica_set = %replica_set_name, "ReplicaSet is not owned by a Deployment");
    }

    debug!(pod = ?pod.metadata.name, "No Deployment found in owner chain");
    None
}
