//! Tool provider trait.
//!
//! A provider knows where releases of a tool are published: how to find the
//! newest tag, how an artifact URL is built, and how to fetch it.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use super::{CacheKey, ResolvedVersion, VersionRequest, validate_tag};
use crate::{Error, Result};

/// Source of release metadata and artifacts for a tool.
///
/// # Example
///
/// ```ignore
/// pub struct GitHubReleaseProvider { /* ... */ }
///
/// #[async_trait]
/// impl ToolProvider for GitHubReleaseProvider {
///     fn name(&self) -> &'static str { "github" }
///     // ...
/// }
/// ```
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Provider name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Look up the tag of the newest published release.
    ///
    /// # Errors
    ///
    /// Returns an upstream error for a non-success status, a parse error for
    /// a malformed body and a transport error for network failures.
    async fn latest_version(&self) -> Result<ResolvedVersion>;

    /// URL of the artifact for `key`.
    fn artifact_url(&self, key: &CacheKey) -> String;

    /// Download `url` to `dest`.
    ///
    /// # Errors
    ///
    /// Returns a download error if the artifact cannot be fetched or written.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;

    /// Turn a version request into a concrete tag.
    ///
    /// Literal tags are returned unchanged without any network access.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a tag that is not a single path
    /// component, and propagates errors from [`ToolProvider::latest_version`].
    async fn resolve_version(&self, request: &VersionRequest) -> Result<ResolvedVersion> {
        match request {
            VersionRequest::Tag(tag) => {
                validate_tag(tag).map_err(|reason| {
                    Error::configuration(format!("invalid version '{tag}': {reason}"))
                })?;
                Ok(ResolvedVersion::new(tag.clone()))
            }
            VersionRequest::Latest => {
                let version = self.latest_version().await?;
                info!(provider = self.name(), %version, "Using latest release: '{version}'");
                Ok(version)
            }
        }
    }
}
