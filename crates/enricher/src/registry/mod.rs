//! Image registry access and latest-image selection.
//!
//! - [`ImageRegistry`] lists a repository's tagged images one page at a time
//! - [`latest_tagged_image`] walks every page and keeps the newest push
//! - [`ImageCoordinates`] splits a container image reference into the parts
//!   needed to look it up and to rebuild it with a new tag

pub mod ecr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::RegistryError;

pub use ecr::{EcrClient, EcrConfig};

/// One image in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDescriptor {
    /// Repository the image belongs to
    pub repository: String,
    /// Tags pointing at this image, in registry order
    pub tags: Vec<String>,
    /// When the image was pushed
    pub pushed_at: DateTime<Utc>,
    /// Content digest, if reported
    pub digest: Option<String>,
}

impl ImageDescriptor {
    /// The tag used when redeploying this image.
    #[must_use]
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }
}

/// One page of a repository listing.
#[derive(Debug, Clone, Default)]
pub struct ImagePage {
    /// Images on this page
    pub images: Vec<ImageDescriptor>,
    /// Token for the next page, `None` on the last page
    pub next_token: Option<String>,
}

/// A registry that can list tagged images.
#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// Fetch one page of tagged images for a repository.
    async fn list_tagged_images(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<ImagePage, RegistryError>;
}

/// Pick the most recently pushed image.
///
/// Ties keep the earliest image in iteration order.
pub fn select_latest<I>(images: I) -> Option<ImageDescriptor>
where
    I: IntoIterator<Item = ImageDescriptor>,
{
    images.into_iter().fold(None, |latest, image| match latest {
        Some(current) if image.pushed_at <= current.pushed_at => Some(current),
        _ => Some(image),
    })
}

/// Walk every page of a repository and return its newest tagged image.
///
/// Returns `Ok(None)` when the repository holds no tagged images.
pub async fn latest_tagged_image(
    registry: &dyn ImageRegistry,
    repository: &str,
) -> Result<Option<ImageDescriptor>, RegistryError> {
    let mut latest: Option<ImageDescriptor> = None;
    let mut next_token = None;
    let mut pages = 0_usize;

    loop {
        let page = registry.list_tagged_images(repository, next_token).await?;
        pages += 1;

        latest = select_latest(latest.into_iter().chain(page.images));

        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    debug!(repository = %repository, pages, found = latest.is_some(), "Scanned registry");
    Ok(latest)
}

/// Registry prefix and repository name parsed from an image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCoordinates {
    /// Everything before the repository (host and any leading path)
    pub registry: String,
    /// Last two path segments
    pub repository: String,
}

impl ImageCoordinates {
    /// Parse an image reference such as
    /// `123456789012.dkr.ecr.ap-south-1.amazonaws.com/team/app:1.4.2`.
    ///
    /// The digest and tag are dropped. A `:` followed by a path (a registry
    /// port) is not treated as a tag.
    #[must_use]
    pub fn parse(image: &str) -> Self {
        let without_digest = image.split_once('@').map_or(image, |(name, _)| name);
        let name = match without_digest.rsplit_once(':') {
            Some((name, tag)) if !tag.contains('/') => name,
            _ => without_digest,
        };

        let parts: Vec<&str> = name.split('/').collect();
        let split = parts.len().saturating_sub(2);

        Self {
            registry: parts[..split].join("/"),
            repository: parts[split..].join("/"),
        }
    }

    /// Build a full image reference for the given tag.
    #[must_use]
    pub fn image_with_tag(&self, tag: &str) -> String {
        if self.registry.is_empty() {
            format!("{}:{tag}", self.repository)
        } else {
            format!("{}/{}:{tag}", self.registry, self.repository)
        }
    }
}
