//! Cache-backed installation of tool executables.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use super::{CacheKey, CacheReceipt, PathRegistry, ToolCache, ToolProvider};
use crate::{Error, Result};

/// Mode applied to downloaded executables.
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o775;

/// An installed tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInstallation {
    /// Directory registered on the search path.
    pub dir: PathBuf,
    /// Full path of the executable inside `dir`.
    pub executable: PathBuf,
    /// Whether the installation came from the cache.
    pub cache_hit: bool,
}

/// Installs tools from a provider into a cache.
pub struct ToolInstaller<'a> {
    cache: &'a ToolCache,
    provider: &'a dyn ToolProvider,
}

impl<'a> ToolInstaller<'a> {
    /// Create an installer for `provider` backed by `cache`.
    #[must_use]
    pub fn new(cache: &'a ToolCache, provider: &'a dyn ToolProvider) -> Self {
        Self { cache, provider }
    }

    /// Make the tool described by `key` available and register it on `paths`.
    ///
    /// A cache hit performs no network access. On a miss the artifact is
    /// downloaded, marked executable, moved into a directory under its
    /// platform leaf name and registered in the cache.
    ///
    /// # Errors
    ///
    /// Returns a download, permission or install error. A failed install
    /// leaves no cache entry behind.
    pub async fn ensure_tool(
        &self,
        key: &CacheKey,
        paths: &mut PathRegistry,
    ) -> Result<ToolInstallation> {
        let executable_name = key.executable_name();

        let (dir, cache_hit) = if let Some(dir) = self.cache.find(key) {
            debug!(tool = %key.tool, version = %key.version, ?dir, "Using cached tool");
            (dir, true)
        } else {
            let dir = self.install(key, &executable_name).await?;
            (dir, false)
        };

        paths.add(&dir);

        Ok(ToolInstallation {
            executable: dir.join(&executable_name),
            dir,
            cache_hit,
        })
    }

    async fn install(&self, key: &CacheKey, executable_name: &str) -> Result<PathBuf> {
        let url = self.provider.artifact_url(key);
        info!(
            tool = %key.tool,
            version = %key.version,
            platform = %key.platform,
            %url,
            "Downloading tool"
        );

        let staging = self.cache.staging_dir();
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| Error::install(&staging, e.to_string()))?;

        let download_path = staging.join(uuid::Uuid::new_v4().to_string());
        let staged_dir = sibling_dir(&download_path);

        let result = self
            .stage(key, &url, &download_path, &staged_dir, executable_name)
            .await;
        if result.is_err() {
            cleanup(&download_path, &staged_dir).await;
        }
        result
    }

    async fn stage(
        &self,
        key: &CacheKey,
        url: &str,
        download_path: &Path,
        staged_dir: &Path,
        executable_name: &str,
    ) -> Result<PathBuf> {
        self.provider.download(url, download_path).await?;
        set_executable(download_path)?;

        tokio::fs::create_dir_all(staged_dir)
            .await
            .map_err(|e| Error::install(staged_dir, e.to_string()))?;
        let executable = staged_dir.join(executable_name);
        tokio::fs::rename(download_path, &executable)
            .await
            .map_err(|e| Error::install(download_path, e.to_string()))?;

        let sha256 = hash_executable(&executable).await?;
        debug!(tool = %key.tool, %sha256, "Caching tool");

        let receipt = CacheReceipt {
            tool: key.tool.clone(),
            version: key.version.to_string(),
            os: key.platform.os.clone(),
            arch: key.platform.arch.clone(),
            sha256,
            source_url: url.to_string(),
        };
        self.cache.register(key, staged_dir, &receipt)
    }
}

/// `<path>_dir`, next to `path`.
fn sibling_dir(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push("_dir");
    path.with_file_name(name)
}

fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE))
            .map_err(|e| Error::permission(path, e))
    }
    #[cfg(not(unix))]
    {
        std::fs::metadata(path)
            .map(|_| ())
            .map_err(|e| Error::permission(path, e))
    }
}

async fn cleanup(download_path: &Path, staged_dir: &Path) {
    if let Err(e) = tokio::fs::remove_file(download_path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %download_path.display(), "Failed to remove partial download: {e}");
    }
    if let Err(e) = tokio::fs::remove_dir_all(staged_dir).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %staged_dir.display(), "Failed to remove staging directory: {e}");
    }
}

/// Digest recorded in the cache receipt.
async fn hash_executable(executable: &Path) -> Result<String> {
    compute_file_sha256(executable)
        .await
        .map_err(|e| Error::install(executable, format!("cannot hash executable: {e}")))
}

/// Compute SHA256 hash of a file.
async fn compute_file_sha256(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
