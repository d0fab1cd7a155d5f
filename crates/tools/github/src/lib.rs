//! GitHub Releases tool provider for cdflow-action.
//!
//! Resolves the newest release tag through the GitHub REST API and downloads
//! raw release assets named `<tool>-<os>-<arch>`.

use async_trait::async_trait;
use cdflow_action_core::tools::{CacheKey, ResolvedVersion, ToolProvider, validate_tag};
use cdflow_action_core::{Error, Result};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Repository publishing `cdflow2` releases.
pub const DEFAULT_REPOSITORY: &str = "mergermarket/cdflow2";
/// Public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Public GitHub web host serving release downloads.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const ACCEPT_GITHUB_V3: &str = "application/vnd.github.v3+json";

/// Release metadata from the API.
///
/// Only the tag is consumed; a missing or non-string `tag_name` is a parse error.
#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

/// Where releases are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    /// `owner/name` of the repository.
    pub repository: String,
    /// Base URL of the REST API.
    pub api_url: String,
    /// Base URL of the web host serving downloads.
    pub server_url: String,
    /// Timeout applied to each request.
    pub timeout: Option<Duration>,
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self {
            repository: DEFAULT_REPOSITORY.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ReleaseSource {
    /// URL of the newest-release metadata.
    #[must_use]
    pub fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/releases/latest",
            self.api_url.trim_end_matches('/'),
            self.repository
        )
    }

    /// URL of the release asset for `key`.
    #[must_use]
    pub fn asset_url(&self, key: &CacheKey) -> String {
        format!(
            "{}/{}/releases/download/{}/{}-{}-{}",
            self.server_url.trim_end_matches('/'),
            self.repository,
            key.version,
            key.tool,
            key.platform.os,
            key.platform.arch
        )
    }
}

/// Tool provider for GitHub Releases.
pub struct GitHubReleaseProvider {
    client: Client,
    source: ReleaseSource,
}

impl GitHubReleaseProvider {
    /// Create a provider for `source`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be initialized.
    pub fn new(source: ReleaseSource) -> Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent());
        if let Some(timeout) = source.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::transport(&source.api_url, e.to_string()))?;
        Ok(Self { client, source })
    }

    /// The release source this provider reads from.
    #[must_use]
    pub fn source(&self) -> &ReleaseSource {
        &self.source
    }
}

#[async_trait]
impl ToolProvider for GitHubReleaseProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn latest_version(&self) -> Result<ResolvedVersion> {
        let url = self.source.latest_release_url();
        debug!(%url, "Fetching latest GitHub release");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, ACCEPT_GITHUB_V3)
            .header(USER_AGENT, user_agent())
            .send()
            .await
            .map_err(|e| Error::transport(&url, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::upstream(
                &url,
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(&url, e.to_string()))?;
        parse_latest_release(&url, &body)
    }

    fn artifact_url(&self, key: &CacheKey) -> String {
        self.source.asset_url(key)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(%url, dest = %dest.display(), "Downloading GitHub asset");

        let mut response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent())
            .send()
            .await
            .map_err(|e| Error::download(url, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::download(url, format!("HTTP {status}")));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::download(url, format!("cannot create {}: {e}", dest.display())))?;
        let mut written = 0_u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::download(url, e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::download(url, e.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| Error::download(url, e.to_string()))?;

        debug!(%url, bytes = written, "Downloaded GitHub asset");
        Ok(())
    }
}

/// `User-Agent` sent with every request.
fn user_agent() -> String {
    format!("cdflow2-action/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_latest_release(url: &str, body: &[u8]) -> Result<ResolvedVersion> {
    if body.is_empty() {
        return Err(Error::parse(url, "no data"));
    }
    let release: LatestRelease = serde_json::from_slice(body)
        .map_err(|e| Error::parse(url, format!("invalid release metadata: {e}")))?;
    validate_tag(&release.tag_name).map_err(|reason| {
        Error::parse(url, format!("unusable tag_name '{}': {reason}", release.tag_name))
    })?;
    Ok(ResolvedVersion::new(release.tag_name))
}
