//! Amazon ECR client (`DescribeImages`).

use async_trait::async_trait;
use aws_sdk_ecr::config::{BehaviorVersion, Region};
use aws_sdk_ecr::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ecr::operation::describe_images::DescribeImagesError;
use aws_sdk_ecr::types::{DescribeImagesFilter, ImageDetail, TagStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

use super::{ImageDescriptor, ImagePage, ImageRegistry};
use crate::error::RegistryError;

/// Default region, matching where the workloads' registry lives.
pub const DEFAULT_REGION: &str = "ap-south-1";

/// Configuration for the ECR client
#[derive(Debug, Clone)]
pub struct EcrConfig {
    /// AWS region
    pub region: String,
    /// API endpoint override (defaults to the regional ECR endpoint)
    pub endpoint: Option<String>,
    /// Per-operation timeout in seconds
    pub timeout_secs: u64,
}

/// ECR client listing tagged images one page at a time.
#[derive(Debug, Clone)]
pub struct EcrClient {
    client: aws_sdk_ecr::Client,
}

impl EcrClient {
    /// Wrap an existing SDK client.
    #[must_use]
    pub fn new(client: aws_sdk_ecr::Client) -> Self {
        Self { client }
    }

    /// Build a client from the default AWS credential chain.
    ///
    /// Credentials resolve lazily on the first request: environment keys,
    /// web identity (IRSA), SSO, profiles, and instance metadata are all tried.
    pub async fn load(config: &EcrConfig) -> Self {
        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.timeout_secs))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(timeouts);
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        Self::new(aws_sdk_ecr::Client::new(&loader.load().await))
    }
}

#[async_trait]
impl ImageRegistry for EcrClient {
    async fn list_tagged_images(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<ImagePage, RegistryError> {
        debug!(repository = %repository, paged = next_token.is_some(), "Describing ECR images");

        let output = self
            .client
            .describe_images()
            .repository_name(repository)
            .filter(
                DescribeImagesFilter::builder()
                    .tag_status(TagStatus::Tagged)
                    .build(),
            )
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| map_describe_error(repository, e.into_service_error()))?;

        let images = output
            .image_details()
            .iter()
            .filter_map(|detail| to_descriptor(repository, detail))
            .collect();

        Ok(ImagePage {
            images,
            next_token: output.next_token().map(ToString::to_string),
        })
    }
}

fn map_describe_error(repository: &str, err: DescribeImagesError) -> RegistryError {
    if err.is_repository_not_found_exception() {
        return RegistryError::RepositoryNotFound(repository.to_string());
    }
    RegistryError::Api {
        code: err.code().unwrap_or("Unhandled").to_string(),
        message: DisplayErrorContext(&err).to_string(),
    }
}

fn to_descriptor(repository: &str, detail: &ImageDetail) -> Option<ImageDescriptor> {
    let Some(pushed_at) = detail
        .image_pushed_at()
        .and_then(|at| DateTime::<Utc>::from_timestamp(at.secs(), at.subsec_nanos()))
    else {
        warn!(
            repository = %repository,
            digest = ?detail.image_digest(),
            "Image has no push time, skipping"
        );
        return None;
    };

    Some(ImageDescriptor {
        repository: detail
            .repository_name()
            .unwrap_or(repository)
            .to_string(),
        tags: detail.image_tags().to_vec(),
        pushed_at,
        digest: detail.image_digest().map(ToString::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ecr::config::retry::RetryConfig;
    use aws_sdk_ecr::config::Credentials;
    use aws_sdk_ecr::types::error::RepositoryNotFoundException;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, header_exists, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TARGET_DESCRIBE_IMAGES: &str = "AmazonEC2ContainerRegistry_V20150921.DescribeImages";

    fn client(server: &MockServer) -> EcrClient {
        let config = aws_sdk_ecr::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(DEFAULT_REGION))
            .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .endpoint_url(server.uri())
            .build();
        EcrClient::new(aws_sdk_ecr::Client::from_conf(config))
    }

    #[tokio::test]
    async fn test_describe_images_pages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"nextToken": "page-2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "imageDetails": [
                    {"repositoryName": "team/app", "imageTags": ["v2"], "imagePushedAt": 1_714_600_000.5}
                ]
            })))
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(header("x-amz-target", TARGET_DESCRIBE_IMAGES))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({
                "repositoryName": "team/app",
                "filter": {"tagStatus": "TAGGED"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "imageDetails": [
                    {"repositoryName": "team/app", "imageTags": ["v1"], "imagePushedAt": 1_714_500_000},
                    {"repositoryName": "team/app", "imageDigest": "sha256:nopush", "imageTags": ["x"]}
                ],
                "nextToken": "page-2"
            })))
            .mount(&server)
            .await;

        let ecr = client(&server);

        let first = ecr.list_tagged_images("team/app", None).await.unwrap();
        assert_eq!(first.images.len(), 1);
        assert_eq!(first.images[0].tags, vec!["v1".to_string()]);
        assert_eq!(first.next_token.as_deref(), Some("page-2"));

        let second = ecr
            .list_tagged_images("team/app", first.next_token)
            .await
            .unwrap();
        assert_eq!(second.images[0].primary_tag(), Some("v2"));
        assert_eq!(second.images[0].pushed_at.timestamp(), 1_714_600_000);
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn test_repository_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "RepositoryNotFoundException",
                "message": "The repository with name 'team/missing' does not exist"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .list_tagged_images("team/missing", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::RepositoryNotFound(repo) if repo == "team/missing"));
    }

    #[tokio::test]
    async fn test_other_errors_keep_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "__type": "AccessDeniedException",
                "message": "not authorized"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .list_tagged_images("team/app", None)
            .await
            .unwrap_err();
        match err {
            RegistryError::Api { code, .. } => assert_eq!(code, "AccessDeniedException"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_not_found_exception_maps_to_repository_not_found() {
        let err = DescribeImagesError::RepositoryNotFoundException(
            RepositoryNotFoundException::builder()
                .message("does not exist")
                .build(),
        );
        assert!(matches!(
            map_describe_error("team/app", err),
            RegistryError::RepositoryNotFound(repo) if repo == "team/app"
        ));
    }
}
