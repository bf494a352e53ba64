//! Kubernetes access for remediation.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::{Container, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use tracing::debug;

use crate::error::ClusterError;

/// Field manager recorded on deployment patches.
const FIELD_MANAGER: &str = "enricher";

/// The cluster operations remediation needs.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Read a pod.
    async fn read_pod(&self, name: &str, namespace: &str) -> Result<Pod, ClusterError>;

    /// Read a replica set.
    async fn read_replica_set(&self, name: &str, namespace: &str)
        -> Result<ReplicaSet, ClusterError>;

    /// Read a deployment.
    async fn read_deployment(&self, name: &str, namespace: &str)
        -> Result<Deployment, ClusterError>;

    /// Submit a modified deployment.
    async fn patch_deployment(
        &self,
        name: &str,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<(), ClusterError>;
}

/// [`ClusterClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Wrap an existing kube client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn map_kube_error(kind: &'static str, name: &str, namespace: &str, err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ClusterError::NotFound {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
        },
        other => ClusterError::Api(other),
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn read_pod(&self, name: &str, namespace: &str) -> Result<Pod, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        pods.get(name)
            .await
            .map_err(|e| map_kube_error("Pod", name, namespace, e))
    }

    async fn read_replica_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ReplicaSet, ClusterError> {
        let replica_sets: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        replica_sets
            .get(name)
            .await
            .map_err(|e| map_kube_error("ReplicaSet", name, namespace, e))
    }

    async fn read_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, ClusterError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        deployments
            .get(name)
            .await
            .map_err(|e| map_kube_error("Deployment", name, namespace, e))
    }

    async fn patch_deployment(
        &self,
        name: &str,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<(), ClusterError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);

        // Server-owned fields are not ours to send back.
        let mut body = deployment.clone();
        body.metadata.managed_fields = None;
        body.status = None;

        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PatchParams::default()
        };

        deployments
            .patch(name, &params, &Patch::Strategic(&body))
            .await
            .map_err(|e| map_kube_error("Deployment", name, namespace, e))?;

        debug!(deployment = %name, namespace = %namespace, "Deployment patched");
        Ok(())
    }
}

/// Names of every owner of the given kind, in reference order.
pub fn owners_of_kind<'a>(
    metadata: &'a ObjectMeta,
    kind: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    metadata
        .owner_references
        .iter()
        .flatten()
        .filter(move |owner| owner.kind == kind)
        .map(|owner| owner.name.as_str())
}

/// Find a container by name in a pod.
#[must_use]
pub fn pod_container<'a>(pod: &'a Pod, name: &str) -> Option<&'a Container> {
    pod.spec
        .as_ref()?
        .containers
        .iter()
        .find(|container| container.name == name)
}

/// Find a container by name in a deployment's pod template.
pub fn deployment_container_mut<'a>(
    deployment: &'a mut Deployment,
    name: &str,
) -> Option<&'a mut Container> {
    deployment
        .spec
        .as_mut()?
        .template
        .spec
        .as_mut()?
        .containers
        .iter_mut()
        .find(|container| container.name == name)
}
