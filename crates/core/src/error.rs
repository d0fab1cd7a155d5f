//! Error types for tool acquisition and command dispatch.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for cdflow-action operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while acquiring `cdflow2` or running it.
#[derive(Error, Debug)]
pub enum Error {
    /// The release metadata API answered with a non-success status.
    #[error("{url}: {status} {message}")]
    Upstream {
        /// The requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Status text reported by the server.
        message: String,
    },

    /// The release metadata response was empty or malformed.
    #[error("{url}: {message}")]
    Parse {
        /// The requested URL.
        url: String,
        /// What was wrong with the body.
        message: String,
    },

    /// Network-level failure (DNS, TLS, connection reset, timeout).
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// The requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The release artifact could not be fetched.
    #[error("Failed to download {url}: {message}")]
    Download {
        /// The artifact URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The downloaded artifact could not be marked executable.
    #[error("Failed to mark {} as executable: {source}", path.display())]
    Permission {
        /// The downloaded file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact could not be moved into the tool cache layout.
    #[error("Failed to install {} into the tool cache: {message}", path.display())]
    Install {
        /// The path being installed.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The delegated process exited unsuccessfully.
    #[error("{command} exited with status {code}")]
    CommandFailure {
        /// Executable that was run.
        command: String,
        /// Exit status to propagate.
        code: i32,
    },

    /// Invalid input or setting.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an upstream status error.
    #[must_use]
    pub fn upstream(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a response parse error.
    #[must_use]
    pub fn parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a download error.
    #[must_use]
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a permission error.
    #[must_use]
    pub fn permission(path: &Path, source: std::io::Error) -> Self {
        Self::Permission {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an install error.
    #[must_use]
    pub fn install(path: &Path, message: impl Into<String>) -> Self {
        Self::Install {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a command failure error.
    #[must_use]
    pub fn command_failure(command: impl Into<String>, code: i32) -> Self {
        Self::CommandFailure {
            command: command.into(),
            code,
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_matches_status_line() {
        let err = Error::upstream("https://api.example/latest", 404, "Not Found");
        assert_eq!(err.to_string(), "https://api.example/latest: 404 Not Found");
    }

    #[test]
    fn test_permission_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::permission(Path::new("/tmp/cdflow2"), io);
        assert!(err.to_string().contains("/tmp/cdflow2"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_command_failure_display() {
        let err = Error::command_failure("cdflow2", 3);
        assert_eq!(err.to_string(), "cdflow2 exited with status 3");
    }

    #[test]
    fn test_io_from() {
        let err: Error = std::io::Error::other("boom").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
