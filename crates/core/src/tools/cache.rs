//! Persistent cache of installed tool executables.
//!
//! Entries are keyed by (tool, version, platform) and looked up by exact match.
//!
//! Structure:
//! ```text
//! <root>/
//! ├── _staging/                         # in-flight downloads
//! └── cdflow2/
//!     └── v1.0.0/
//!         ├── linux-amd64/
//!         │   └── cdflow2
//!         └── linux-amd64.complete      # registration marker
//! ```
//!
//! A directory without its `.complete` marker is not an entry.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::{PlatformIdentity, ResolvedVersion};
use crate::{Error, Result};

const STAGING_DIR: &str = "_staging";
const MARKER_SUFFIX: &str = "complete";

/// Get the default tool cache directory.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("cdflow-action")
        .join("tools")
}

/// Exact-match key of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Tool name (e.g., "cdflow2").
    pub tool: String,
    /// Concrete release tag.
    pub version: ResolvedVersion,
    /// Target platform.
    pub platform: PlatformIdentity,
}

impl CacheKey {
    /// Create a new key.
    #[must_use]
    pub fn new(tool: impl Into<String>, version: ResolvedVersion, platform: PlatformIdentity) -> Self {
        Self {
            tool: tool.into(),
            version,
            platform,
        }
    }

    /// Leaf name of the executable for this key's platform.
    #[must_use]
    pub fn executable_name(&self) -> String {
        self.platform.executable_name(&self.tool)
    }
}

/// Contents of a registration marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheReceipt {
    /// Tool name.
    pub tool: String,
    /// Release tag.
    pub version: String,
    /// Operating system.
    pub os: String,
    /// Normalized architecture.
    pub arch: String,
    /// SHA256 of the installed executable.
    pub sha256: String,
    /// URL the artifact was downloaded from.
    pub source_url: String,
}

/// On-disk tool cache.
///
/// Default location: `~/.cache/cdflow-action/tools/`
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
}

impl Default for ToolCache {
    fn default() -> Self {
        Self::new(default_cache_dir())
    }
}

impl ToolCache {
    /// Create a cache at the specified root directory.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the executable for `key`.
    #[must_use]
    pub fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(&key.tool)
            .join(key.version.as_str())
            .join(key.platform.to_string())
    }

    /// Path of the registration marker for `key`.
    #[must_use]
    pub fn marker_path(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(&key.tool)
            .join(key.version.as_str())
            .join(format!("{}.{MARKER_SUFFIX}", key.platform))
    }

    /// Directory for in-flight downloads.
    ///
    /// Lives under the root so staged files can be renamed into place.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Look up the installation directory for `key`.
    #[must_use]
    pub fn find(&self, key: &CacheKey) -> Option<PathBuf> {
        let dir = self.entry_dir(key);
        if dir.is_dir() && self.marker_path(key).is_file() {
            trace!(tool = %key.tool, version = %key.version, platform = %key.platform, ?dir, "Cache hit");
            Some(dir)
        } else {
            trace!(tool = %key.tool, version = %key.version, platform = %key.platform, "Cache miss");
            None
        }
    }

    /// Read the registration marker for `key`, if the entry exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker exists but cannot be read or parsed.
    pub fn receipt(&self, key: &CacheKey) -> Result<Option<CacheReceipt>> {
        let marker = self.marker_path(key);
        if !marker.is_file() {
            return Ok(None);
        }
        let content = std::fs::read(&marker)?;
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| Error::install(&marker, format!("invalid cache marker: {e}")))
    }

    /// Move a staged installation directory into the cache under `key`.
    ///
    /// Any previous entry for the same key is replaced. The marker is written
    /// last, so an interrupted registration leaves no visible entry.
    ///
    /// # Errors
    ///
    /// Returns an install error if the directory cannot be moved or the
    /// marker cannot be written.
    pub fn register(
        &self,
        key: &CacheKey,
        staged_dir: &Path,
        receipt: &CacheReceipt,
    ) -> Result<PathBuf> {
        let dest = self.entry_dir(key);
        let marker = self.marker_path(key);

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::install(parent, e.to_string()))?;
        }

        match std::fs::remove_file(&marker) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::install(&marker, e.to_string())),
        }
        if dest.exists() {
            std::fs::remove_dir_all(&dest).map_err(|e| Error::install(&dest, e.to_string()))?;
        }

        std::fs::rename(staged_dir, &dest).map_err(|e| {
            Error::install(
                staged_dir,
                format!("cannot move to {}: {e}", dest.display()),
            )
        })?;

        let content = serde_json::to_vec_pretty(receipt)
            .map_err(|e| Error::install(&marker, e.to_string()))?;
        std::fs::write(&marker, content).map_err(|e| Error::install(&marker, e.to_string()))?;

        debug!(tool = %key.tool, version = %key.version, platform = %key.platform, ?dest, "Registered tool in cache");
        Ok(dest)
    }
}
