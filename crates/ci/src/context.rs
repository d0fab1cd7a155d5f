//! Identity of the current workflow run, read from the runner environment.

use std::fmt;

/// Identifiers of the workflow run this process belongs to.
///
/// Every field is optional; the runner sets all of them, local invocations
/// usually none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    /// `owner/name` of the repository (`GITHUB_REPOSITORY`).
    pub repository: Option<String>,
    /// Sequential run number of the workflow (`GITHUB_RUN_NUMBER`).
    pub run_number: Option<String>,
    /// Attempt number of the run (`GITHUB_RUN_ATTEMPT`).
    pub run_attempt: Option<String>,
    /// Commit that triggered the run (`GITHUB_SHA`).
    pub sha: Option<String>,
}

impl RunContext {
    /// Read the run context from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            repository: std::env::var("GITHUB_REPOSITORY").ok(),
            run_number: std::env::var("GITHUB_RUN_NUMBER").ok(),
            run_attempt: std::env::var("GITHUB_RUN_ATTEMPT").ok(),
            sha: std::env::var("GITHUB_SHA").ok(),
        }
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sha = self.sha.as_deref().unwrap_or_default();
        write!(
            f,
            "{} #{}.{} ({})",
            self.repository.as_deref().unwrap_or("local"),
            self.run_number.as_deref().unwrap_or("-"),
            self.run_attempt.as_deref().unwrap_or("-"),
            sha.get(..7).unwrap_or(sha)
        )
    }
}
