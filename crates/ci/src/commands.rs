//! GitHub Actions workflow commands.
//!
//! Step outputs go to the file named by `GITHUB_OUTPUT` in the heredoc format
//! the runner expects. Runners that predate environment files get the legacy
//! `::set-output` command on stdout instead.

use cdflow_action_core::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for step output values.
pub trait OutputSink: Send + Sync {
    /// Publish `value` as the step output `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn set_output(&self, name: &str, value: &str) -> Result<()>;
}

/// Workflow command writer bound to the runner's environment files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowCommands {
    /// File receiving step outputs (`GITHUB_OUTPUT`).
    pub output_file: Option<PathBuf>,
    /// File receiving search path additions (`GITHUB_PATH`).
    pub path_file: Option<PathBuf>,
}

impl WorkflowCommands {
    /// Bind to the environment files advertised by the runner.
    ///
    /// Empty values are treated as absent.
    #[must_use]
    pub fn from_env() -> Self {
        let file = |name: &str| {
            std::env::var_os(name)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };
        Self {
            output_file: file("GITHUB_OUTPUT"),
            path_file: file("GITHUB_PATH"),
        }
    }

    /// Make `dir` available on the search path of subsequent steps.
    ///
    /// Returns `false` when the runner provides no `GITHUB_PATH` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the path file cannot be appended to.
    pub fn add_path(&self, dir: &Path) -> Result<bool> {
        let Some(path_file) = &self.path_file else {
            debug!(dir = %dir.display(), "GITHUB_PATH not set, skipping path publication");
            return Ok(false);
        };
        append(path_file, &format!("{}\n", dir.display()))?;
        debug!(dir = %dir.display(), "Published directory to GITHUB_PATH");
        Ok(true)
    }

    /// Render the `::error::` annotation for `message`.
    #[must_use]
    pub fn error_annotation(message: &str) -> String {
        format!("::error::{}", escape_data(message))
    }
}

impl OutputSink for WorkflowCommands {
    fn set_output(&self, name: &str, value: &str) -> Result<()> {
        match &self.output_file {
            Some(output_file) => append(output_file, &heredoc(name, value)),
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", legacy_set_output(name, value))?;
                Ok(())
            }
        }
    }
}

/// Escape `%`, carriage return and line feed for workflow command data.
#[must_use]
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn heredoc(name: &str, value: &str) -> String {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn legacy_set_output(name: &str, value: &str) -> String {
    format!("::set-output name={name}::{}", escape_data(value))
}

fn append(file: &Path, content: &str) -> Result<()> {
    let mut handle = OpenOptions::new().create(true).append(true).open(file)?;
    handle.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("plain"), "plain");
        assert_eq!(escape_data("50%\r\nnext"), "50%25%0D%0Anext");
    }

    #[test]
    fn test_legacy_set_output() {
        assert_eq!(
            legacy_set_output("appVersion", "org_repo-1-1-abc"),
            "::set-output name=appVersion::org_repo-1-1-abc"
        );
        assert_eq!(
            legacy_set_output("x", "a\nb"),
            "::set-output name=x::a%0Ab"
        );
    }

    #[test]
    fn test_error_annotation() {
        assert_eq!(
            WorkflowCommands::error_annotation("boom\nat line 2"),
            "::error::boom%0Aat line 2"
        );
    }

    #[test]
    fn test_set_output_appends_heredoc() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("output");
        std::fs::write(&output, "earlier=1\n").unwrap();
        let commands = WorkflowCommands {
            output_file: Some(output.clone()),
            path_file: None,
        };

        commands.set_output("appVersion", "org_repo-42-1-abc").unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "earlier=1");
        let delimiter = lines[1].strip_prefix("appVersion<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        assert_eq!(lines[2], "org_repo-42-1-abc");
        assert_eq!(lines[3], delimiter);
    }

    #[test]
    fn test_add_path() {
        let temp = TempDir::new().unwrap();
        let path_file = temp.path().join("path");
        let commands = WorkflowCommands {
            output_file: None,
            path_file: Some(path_file.clone()),
        };

        assert!(commands.add_path(Path::new("/cache/cdflow2/v1/linux-amd64")).unwrap());
        assert!(commands.add_path(Path::new("/other")).unwrap());

        assert_eq!(
            std::fs::read_to_string(&path_file).unwrap(),
            "/cache/cdflow2/v1/linux-amd64\n/other\n"
        );
    }

    #[test]
    fn test_add_path_without_runner_file() {
        let commands = WorkflowCommands::default();
        assert!(!commands.add_path(Path::new("/cache")).unwrap());
    }
}
