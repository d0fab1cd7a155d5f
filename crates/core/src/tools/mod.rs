//! Tool acquisition for the delegated `cdflow2` executable.
//!
//! # Architecture
//!
//! - [`PlatformIdentity`] - the (OS, architecture) pair used in artifact names
//! - [`VersionRequest`] / [`ResolvedVersion`] - "latest" or a concrete tag
//! - [`ToolCache`] / [`CacheKey`] - persistent store of installed executables
//! - [`PathRegistry`] - directories published on the executable search path
//! - [`ToolProvider`] - source of release metadata and artifacts
//! - [`ToolInstaller`] - cache lookup, download, install and registration
//!
//! # Example
//!
//! ```ignore
//! use cdflow_action_core::tools::{
//!     CacheKey, PathRegistry, PlatformIdentity, ToolCache, ToolInstaller, VersionRequest,
//! };
//!
//! let version = provider.resolve_version(&VersionRequest::parse("latest")?).await?;
//! let key = CacheKey::new("cdflow2", version, PlatformIdentity::current());
//! let mut paths = PathRegistry::new();
//! let installed = ToolInstaller::new(&cache, &provider).ensure_tool(&key, &mut paths).await?;
//! ```

mod cache;
mod installer;
mod paths;
mod platform;
mod provider;
mod version;

pub use cache::{CacheKey, CacheReceipt, ToolCache, default_cache_dir};
pub use installer::{ToolInstallation, ToolInstaller};
pub use paths::PathRegistry;
pub use platform::{PlatformIdentity, host_arch, host_os, resolve_arch};
pub use provider::ToolProvider;
pub use version::{LATEST, ResolvedVersion, VersionRequest, validate_tag};
