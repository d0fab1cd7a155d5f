//! Executable search path registry.
//!
//! Directories registered here live for the rest of the process. They are
//! searched before the inherited `PATH`, newest registration first, and are
//! handed to child processes through an explicit `PATH` value rather than by
//! mutating the process environment.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, Result};

/// Ordered set of directories published on the executable search path.
#[derive(Debug, Clone, Default)]
pub struct PathRegistry {
    dirs: Vec<PathBuf>,
}

impl PathRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dir`, moving it to the front if already present.
    ///
    /// Returns `true` if the directory was not registered before.
    pub fn add(&mut self, dir: &Path) -> bool {
        let existing = self.dirs.iter().position(|d| d == dir);
        if let Some(index) = existing {
            self.dirs.remove(index);
        }
        self.dirs.insert(0, dir.to_path_buf());
        debug!(dir = %dir.display(), "Registered directory on search path");
        existing.is_none()
    }

    /// Registered directories, highest priority first.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Find an executable leaf name in the registered directories.
    #[must_use]
    pub fn find_executable(&self, leaf_name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(leaf_name))
            .find(|candidate| candidate.is_file())
    }

    /// Build a `PATH` value with the registered directories ahead of `inherited`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a directory contains the platform's
    /// path separator.
    pub fn search_path(&self, inherited: Option<&OsStr>) -> Result<OsString> {
        let inherited: Vec<PathBuf> = inherited
            .map(|value| std::env::split_paths(value).collect())
            .unwrap_or_default();
        std::env::join_paths(self.dirs.iter().chain(inherited.iter()))
            .map_err(|e| Error::configuration(format!("cannot build PATH: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_is_a_set() {
        let mut registry = PathRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.add(Path::new("/opt/a")));
        assert!(registry.add(Path::new("/opt/b")));
        assert!(!registry.add(Path::new("/opt/a")));

        let dirs: Vec<_> = registry.iter().collect();
        assert_eq!(dirs, vec![Path::new("/opt/a"), Path::new("/opt/b")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_prepends_registered() -> Result<()> {
        let mut registry = PathRegistry::new();
        registry.add(Path::new("/opt/tool"));

        let path = registry.search_path(Some(OsStr::new("/usr/bin:/bin")))?;
        assert_eq!(path, OsString::from("/opt/tool:/usr/bin:/bin"));

        let path = registry.search_path(None)?;
        assert_eq!(path, OsString::from("/opt/tool"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_rejects_separator() {
        let mut registry = PathRegistry::new();
        registry.add(Path::new("/opt/a:b"));
        assert!(matches!(
            registry.search_path(None),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_find_executable() -> Result<()> {
        let temp = TempDir::new()?;
        let empty = temp.path().join("empty");
        let tools = temp.path().join("tools");
        std::fs::create_dir_all(&empty)?;
        std::fs::create_dir_all(&tools)?;
        std::fs::write(tools.join("cdflow2"), b"#!/bin/sh\n")?;

        let mut registry = PathRegistry::new();
        registry.add(&tools);
        registry.add(&empty);

        assert_eq!(
            registry.find_executable("cdflow2"),
            Some(tools.join("cdflow2"))
        );
        assert!(registry.find_executable("missing").is_none());
        Ok(())
    }
}
