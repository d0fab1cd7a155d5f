//! Version requests and resolved release tags.

use std::fmt;

use crate::{Error, Result};

/// Sentinel requesting the newest published release.
pub const LATEST: &str = "latest";

/// A version as requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequest {
    /// The newest published release.
    Latest,
    /// A literal release tag. Existence is not checked.
    Tag(String),
}

impl VersionRequest {
    /// Parse a request; only the exact string `latest` is the sentinel.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a tag that cannot be used as a
    /// single cache path component.
    pub fn parse(input: &str) -> Result<Self> {
        if input == LATEST {
            return Ok(Self::Latest);
        }
        validate_tag(input)
            .map_err(|reason| Error::configuration(format!("invalid version '{input}': {reason}")))?;
        Ok(Self::Tag(input.to_string()))
    }
}

/// Check that `tag` names exactly one path component.
///
/// Tags become a directory name in the tool cache, so separators and the
/// `.`/`..` components are rejected.
///
/// # Errors
///
/// Returns the reason the tag is unusable.
pub fn validate_tag(tag: &str) -> std::result::Result<(), &'static str> {
    if tag.is_empty() {
        return Err("tag is empty");
    }
    if tag == "." || tag == ".." {
        return Err("tag is a relative path component");
    }
    if tag.contains(['/', '\\', '\0']) {
        return Err("tag contains a path separator or NUL");
    }
    Ok(())
}

impl fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Tag(tag) => f.write_str(tag),
        }
    }
}

/// A concrete release tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedVersion(String);

impl ResolvedVersion {
    /// Wrap a concrete tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
