//! Platform detection and normalization.
//!
//! Release artifacts are named `<tool>-<os>-<arch>` using the naming of the
//! Node.js runtime that originally hosted this action (`linux`, `darwin`,
//! `win32` / `x64`, `arm64`), except that `x64` is published as `amd64`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// OS name used for Windows artifacts.
const WINDOWS: &str = "win32";

/// Map a raw architecture name to the one used in release artifact names.
///
/// Only `x64` is renamed (to `amd64`); anything else passes through.
#[must_use]
pub fn resolve_arch(raw: &str) -> String {
    match raw {
        "x64" => "amd64".to_string(),
        other => other.to_string(),
    }
}

/// Raw name of the host operating system.
#[must_use]
pub fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => WINDOWS,
        other => other,
    }
}

/// Raw name of the host architecture, before [`resolve_arch`].
#[must_use]
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        other => other,
    }
}

/// The (OS, normalized architecture) pair that selects a release artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformIdentity {
    /// Operating system (linux, darwin, win32).
    pub os: String,
    /// Normalized architecture (amd64, arm64).
    pub arch: String,
}

impl PlatformIdentity {
    /// Create a platform from an OS and an already-normalized architecture.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Create a platform from raw host names, normalizing the architecture.
    #[must_use]
    pub fn from_raw(os: &str, raw_arch: &str) -> Self {
        Self::new(os, resolve_arch(raw_arch))
    }

    /// Get the platform of the running host.
    #[must_use]
    pub fn current() -> Self {
        Self::from_raw(host_os(), host_arch())
    }

    /// Whether executables on this platform carry an `.exe` suffix.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == WINDOWS
    }

    /// Leaf name of `tool`'s executable on this platform.
    #[must_use]
    pub fn executable_name(&self, tool: &str) -> String {
        if self.is_windows() {
            format!("{tool}.exe")
        } else {
            tool.to_string()
        }
    }
}

impl fmt::Display for PlatformIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_arch_x64() {
        assert_eq!(resolve_arch("x64"), "amd64");
    }

    #[test]
    fn test_resolve_arch_passes_through() {
        for raw in ["arm64", "ia32", "amd64", "riscv64", "X64", ""] {
            assert_eq!(resolve_arch(raw), raw);
        }
    }

    #[test]
    fn test_from_raw_normalizes_arch() {
        let p = PlatformIdentity::from_raw("linux", "x64");
        assert_eq!(p, PlatformIdentity::new("linux", "amd64"));
    }

    #[test]
    fn test_executable_name() {
        assert_eq!(
            PlatformIdentity::new("linux", "amd64").executable_name("cdflow2"),
            "cdflow2"
        );
        assert_eq!(
            PlatformIdentity::new("darwin", "arm64").executable_name("cdflow2"),
            "cdflow2"
        );
        assert_eq!(
            PlatformIdentity::new("win32", "amd64").executable_name("cdflow2"),
            "cdflow2.exe"
        );
    }

    #[test]
    fn test_platform_display() {
        let p = PlatformIdentity::new("darwin", "arm64");
        assert_eq!(format!("{p}"), "darwin-arm64");
    }

    #[test]
    fn test_current_platform() {
        let p = PlatformIdentity::current();
        assert!(!p.os.is_empty());
        assert!(!p.arch.is_empty());
        assert_ne!(p.arch, "x64");
        assert_ne!(p.os, "macos");
    }

    #[test]
    fn test_host_names_use_runtime_convention() {
        assert_ne!(host_arch(), "x86_64");
        assert_ne!(host_arch(), "aarch64");
        assert_ne!(host_os(), "windows");
    }
}
