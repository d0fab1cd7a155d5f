use crate::dispatch::DispatchInputs;
use crate::tracing::{LogLevel, TracingConfig, TracingFormat};
use cdflow_action_ci::WorkflowCommands;
use cdflow_action_core::tools::{LATEST, VersionRequest};
use cdflow_action_tools_github::{DEFAULT_API_URL, DEFAULT_SERVER_URL, ReleaseSource};
use clap::{ArgAction, Parser};
use miette::{Diagnostic, Report};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Acquisition failure exit code
pub const EXIT_ACQUISITION: i32 = 1;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;

/// Command-line interface.
///
/// Every action input can also be supplied through the `INPUT_<NAME>`
/// variable the runner sets for `with:` values.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cdflow-action",
    about = "Install cdflow2 and run it",
    disable_version_flag = true
)]
pub struct Cli {
    /// Release tag of cdflow2 to install, or "latest"
    #[arg(long, env = "INPUT_VERSION", default_value = LATEST)]
    pub version: String,

    /// App version to use instead of the one built from the run context
    #[arg(long = "app-version", env = "INPUT_APPVERSION")]
    pub app_version: Option<String>,

    /// cdflow2 command to run: release, deploy, destroy or shell
    #[arg(long, env = "INPUT_COMMAND", default_value = "")]
    pub command: String,

    /// Component name passed as --component
    #[arg(long, env = "INPUT_COMPONENT")]
    pub component: Option<String>,

    /// Pass --new-state to deploy
    #[arg(
        long = "new-state",
        env = "INPUT_NEWSTATE",
        default_value = "false",
        action = ArgAction::Set,
        value_parser = parse_input_bool,
    )]
    pub new_state: bool,

    /// Target environment for deploy, destroy and shell
    #[arg(long, env = "INPUT_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Extra arguments for shell, split on whitespace
    #[arg(long = "shell-args", env = "INPUT_SHELLARGS", default_value = "")]
    pub shell_args: String,

    /// Root of the persistent tool cache
    #[arg(long = "tool-cache-dir", env = "RUNNER_TOOL_CACHE")]
    pub tool_cache_dir: Option<PathBuf>,

    /// Base URL of the GitHub REST API publishing cdflow2 releases
    ///
    /// Independent of the runner's `GITHUB_API_URL`, which names the
    /// workflow's own GitHub host.
    #[arg(long = "api-url", env = "CDFLOW_ACTION_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Base URL serving cdflow2 release downloads
    #[arg(
        long = "server-url",
        env = "CDFLOW_ACTION_SERVER_URL",
        default_value = DEFAULT_SERVER_URL
    )]
    pub server_url: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long = "http-timeout", default_value_t = 300)]
    pub http_timeout: u64,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value_t = TracingFormat::Compact)]
    pub log_format: TracingFormat,

    /// Log level; defaults to debug when RUNNER_DEBUG=1, otherwise info
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevel>,
}

impl Cli {
    /// Requested cdflow2 version; an empty input means latest.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a tag that is not a single path
    /// component.
    pub fn version_request(&self) -> cdflow_action_core::Result<VersionRequest> {
        if self.version.is_empty() {
            Ok(VersionRequest::Latest)
        } else {
            VersionRequest::parse(&self.version)
        }
    }

    /// Where to look up and download releases.
    #[must_use]
    pub fn release_source(&self) -> ReleaseSource {
        ReleaseSource {
            api_url: self.api_url.clone(),
            server_url: self.server_url.clone(),
            timeout: Some(Duration::from_secs(self.http_timeout)),
            ..ReleaseSource::default()
        }
    }

    /// Inputs forwarded to the dispatcher.
    #[must_use]
    pub fn dispatch_inputs(&self) -> DispatchInputs {
        DispatchInputs {
            component: self.component.clone().filter(|c| !c.is_empty()),
            new_state: self.new_state,
            environment: self.environment.clone().filter(|e| !e.is_empty()),
            shell_args: self.shell_args.clone(),
        }
    }

    /// Tracing configuration for this invocation.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        let runner_debug = std::env::var("RUNNER_DEBUG").ok();
        TracingConfig {
            format: self.log_format,
            level: TracingConfig::resolve_level(self.log_level, runner_debug.as_deref()),
        }
    }
}

/// Parse a boolean action input.
///
/// Accepts the YAML 1.2 core schema spellings. An empty value is an unset
/// input and reads as false.
///
/// # Errors
///
/// Returns a message naming the accepted spellings for anything else.
pub fn parse_input_bool(value: &str) -> Result<bool, String> {
    match value {
        "true" | "True" | "TRUE" => Ok(true),
        "" | "false" | "False" | "FALSE" => Ok(false),
        other => Err(format!(
            "'{other}' is not a boolean; use one of true, True, TRUE, false, False, FALSE"
        )),
    }
}

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Invalid input or setting (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(cdflow_action::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// cdflow2 could not be resolved, downloaded or installed (exit code 1)
    #[error("Failed to install cdflow2: {message}")]
    #[diagnostic(code(cdflow_action::acquisition))]
    Acquisition {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// cdflow2 ran and failed (exit code of the process)
    #[error("{message}")]
    #[diagnostic(code(cdflow_action::command))]
    Command {
        /// The error message
        message: String,
        /// Exit status to propagate
        code: i32,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new acquisition error with help text
    #[must_use]
    pub fn acquisition_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Acquisition {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Convert `cdflow_action_core::Error` to the matching `CliError` variant.
impl From<cdflow_action_core::Error> for CliError {
    fn from(err: cdflow_action_core::Error) -> Self {
        use cdflow_action_core::Error;
        match err {
            Error::Configuration(message) => Self::config_with_help(
                message,
                "Check the inputs passed to the action in the workflow step",
            ),
            Error::CommandFailure { code, .. } => Self::Command {
                message: err.to_string(),
                code,
            },
            Error::Upstream { .. } | Error::Parse { .. } | Error::Transport { .. } => {
                Self::acquisition_with_help(
                    err.to_string(),
                    "Check that the GitHub API is reachable and the release exists",
                )
            }
            Error::Download { .. } => Self::acquisition_with_help(
                err.to_string(),
                "Check that the requested version publishes an asset for this platform",
            ),
            Error::Permission { .. } | Error::Install { .. } | Error::Io(_) => {
                Self::acquisition_with_help(
                    err.to_string(),
                    "Check permissions on the tool cache directory",
                )
            }
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Acquisition { .. } => EXIT_ACQUISITION,
        CliError::Command { code, .. } => *code,
    }
}

/// Report a fatal error as a workflow annotation and a miette report.
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError) {
    println!("{}", WorkflowCommands::error_annotation(&err.to_string()));
    let _ = io::stdout().flush();

    let report = Report::new(err.clone());
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdflow_action_core::Error;
    use std::path::Path;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["cdflow-action"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_input_bool() {
        for value in ["true", "True", "TRUE"] {
            assert_eq!(parse_input_bool(value), Ok(true));
        }
        for value in ["", "false", "False", "FALSE"] {
            assert_eq!(parse_input_bool(value), Ok(false));
        }
        for value in ["yes", "1", "tRUE", "on"] {
            assert!(parse_input_bool(value).is_err(), "{value}");
        }
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(
            [
                "INPUT_VERSION",
                "INPUT_APPVERSION",
                "INPUT_COMMAND",
                "INPUT_COMPONENT",
                "INPUT_NEWSTATE",
                "INPUT_ENVIRONMENT",
                "INPUT_SHELLARGS",
                "RUNNER_TOOL_CACHE",
                "CDFLOW_ACTION_API_URL",
                "CDFLOW_ACTION_SERVER_URL",
            ],
            || {
                let cli = parse(&[]);
                assert_eq!(cli.version_request().unwrap(), VersionRequest::Latest);
                assert_eq!(cli.command, "");
                assert!(!cli.new_state);
                assert_eq!(cli.http_timeout, 300);
                assert_eq!(cli.log_format, TracingFormat::Compact);
                assert_eq!(cli.release_source(), ReleaseSource::default());
            },
        );
    }

    #[test]
    fn test_inputs_from_env() {
        temp_env::with_vars(
            [
                ("INPUT_VERSION", Some("v1.2.3")),
                ("INPUT_COMMAND", Some("deploy")),
                ("INPUT_COMPONENT", Some("")),
                ("INPUT_NEWSTATE", Some("True")),
                ("INPUT_ENVIRONMENT", Some("staging")),
                ("RUNNER_TOOL_CACHE", Some("/opt/hostedtoolcache")),
            ],
            || {
                let cli = parse(&[]);
                assert_eq!(
                    cli.version_request().unwrap(),
                    VersionRequest::Tag("v1.2.3".to_string())
                );
                assert_eq!(cli.tool_cache_dir.as_deref(), Some(Path::new("/opt/hostedtoolcache")));

                let inputs = cli.dispatch_inputs();
                assert_eq!(inputs.component, None);
                assert!(inputs.new_state);
                assert_eq!(inputs.environment.as_deref(), Some("staging"));
            },
        );
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        temp_env::with_var("INPUT_NEWSTATE", Some("yes"), || {
            assert!(Cli::try_parse_from(["cdflow-action"]).is_err());
        });
    }

    #[test]
    fn test_empty_version_means_latest() {
        temp_env::with_vars_unset(["INPUT_VERSION", "INPUT_NEWSTATE"], || {
            let cli = parse(&["--version", ""]);
            assert_eq!(cli.version_request().unwrap(), VersionRequest::Latest);
        });
    }

    #[test]
    fn test_version_outside_cache_is_rejected() {
        temp_env::with_var("INPUT_VERSION", Some("../../.."), || {
            let err = parse(&[]).version_request().unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{err:?}");
        });
    }

    #[test]
    fn test_runner_host_does_not_redirect_release_lookup() {
        temp_env::with_vars(
            [
                ("GITHUB_API_URL", Some("https://ghes.corp.example/api/v3")),
                ("GITHUB_SERVER_URL", Some("https://ghes.corp.example")),
                ("CDFLOW_ACTION_API_URL", None),
                ("CDFLOW_ACTION_SERVER_URL", None),
            ],
            || {
                let source = parse(&[]).release_source();
                assert_eq!(
                    source.latest_release_url(),
                    "https://api.github.com/repos/mergermarket/cdflow2/releases/latest"
                );
                assert_eq!(source.server_url, "https://github.com");
            },
        );
    }

    #[test]
    fn test_release_host_override() {
        temp_env::with_var("CDFLOW_ACTION_API_URL", Some("http://127.0.0.1:8080"), || {
            assert_eq!(parse(&[]).api_url, "http://127.0.0.1:8080");
        });
    }

    #[test]
    fn test_error_conversion() {
        let cli_err: CliError = Error::configuration("bad command").into();
        assert!(matches!(
            cli_err,
            CliError::Config { ref message, help: Some(_) } if message == "bad command"
        ));
        assert_eq!(exit_code_for(&cli_err), EXIT_CLI);

        let cli_err: CliError = Error::upstream("u", 404, "Not Found").into();
        assert!(matches!(cli_err, CliError::Acquisition { .. }));
        assert_eq!(exit_code_for(&cli_err), EXIT_ACQUISITION);

        let cli_err: CliError = Error::download("u", "HTTP 404").into();
        assert_eq!(exit_code_for(&cli_err), EXIT_ACQUISITION);

        let cli_err: CliError = Error::command_failure("cdflow2", 3).into();
        assert!(matches!(cli_err, CliError::Command { code: 3, .. }));
        assert_eq!(exit_code_for(&cli_err), 3);
    }

    #[test]
    fn test_exit_code_constants() {
        assert_eq!(EXIT_OK, 0);
        assert_eq!(EXIT_ACQUISITION, 1);
        assert_eq!(EXIT_CLI, 2);
    }
}
