//! Argument assembly and execution of the delegated `cdflow2` command.

use async_trait::async_trait;
use cdflow_action_ci::AppVersion;
use cdflow_action_core::tools::PathRegistry;
use cdflow_action_core::{Error, Result};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{debug, info};

/// Name of the delegated tool.
pub const TOOL: &str = "cdflow2";

/// `cdflow2` subcommands this action knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegatedCommand {
    /// Build and publish a release.
    Release,
    /// Deploy a release to an environment.
    Deploy,
    /// Destroy an environment.
    Destroy,
    /// Open a shell against an environment.
    Shell,
}

impl DelegatedCommand {
    /// Parse the `command` input. An empty value means no command.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for anything that is not a known command.
    pub fn parse(input: &str) -> Result<Option<Self>> {
        match input {
            "" => Ok(None),
            "release" => Ok(Some(Self::Release)),
            "deploy" => Ok(Some(Self::Deploy)),
            "destroy" => Ok(Some(Self::Destroy)),
            "shell" => Ok(Some(Self::Shell)),
            other => Err(Error::configuration(format!(
                "unknown command '{other}'; expected release, deploy, destroy or shell"
            ))),
        }
    }

    /// Subcommand token passed to `cdflow2`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Deploy => "deploy",
            Self::Destroy => "destroy",
            Self::Shell => "shell",
        }
    }

    /// Whether the target environment is a positional argument.
    #[must_use]
    pub const fn takes_environment(self) -> bool {
        matches!(self, Self::Deploy | Self::Destroy | Self::Shell)
    }

    /// Whether the app version is a positional argument and `JOB_NAME`.
    #[must_use]
    pub const fn takes_app_version(self) -> bool {
        matches!(self, Self::Release | Self::Deploy | Self::Destroy)
    }
}

impl fmt::Display for DelegatedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action inputs that shape the delegated command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchInputs {
    /// Passed as `--component <name>` ahead of the subcommand.
    pub component: Option<String>,
    /// Adds `--new-state` to deploy.
    pub new_state: bool,
    /// Target environment.
    pub environment: Option<String>,
    /// Free text appended to shell, split on whitespace.
    pub shell_args: String,
}

impl DispatchInputs {
    /// Check that `command` has everything it needs.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the environment is missing for a
    /// command that takes one.
    pub fn validate(&self, command: DelegatedCommand) -> Result<()> {
        if command.takes_environment() && self.environment.is_none() {
            return Err(Error::configuration(format!(
                "the environment input is required for {command}"
            )));
        }
        Ok(())
    }
}

/// A fully assembled invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable to run.
    pub program: PathBuf,
    /// Arguments in order.
    pub args: Vec<String>,
    /// Complete child environment.
    pub env: BTreeMap<String, String>,
}

/// Assemble the argument vector and environment for `command`.
///
/// The child environment is `ambient` restricted to UTF-8 entries, with
/// `JOB_NAME` and `PATH` overridden. Any ambient spelling of `PATH` is
/// replaced.
///
/// # Errors
///
/// Returns a configuration error if the inputs are incomplete for `command`
/// or `search_path` is not valid UTF-8.
pub fn build_command_spec<I>(
    program: PathBuf,
    command: DelegatedCommand,
    inputs: &DispatchInputs,
    app_version: &AppVersion<'_>,
    ambient: I,
    search_path: OsString,
) -> Result<CommandSpec>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    inputs.validate(command)?;

    let mut env: BTreeMap<String, String> = ambient
        .into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect();

    let mut args = Vec::new();
    if let Some(component) = &inputs.component {
        args.push("--component".to_string());
        args.push(component.clone());
    }
    args.push(command.as_str().to_string());
    if command == DelegatedCommand::Deploy && inputs.new_state {
        args.push("--new-state".to_string());
    }
    if command.takes_environment()
        && let Some(environment) = &inputs.environment
    {
        args.push(environment.clone());
    }
    if command.takes_app_version() {
        let version = app_version.get().to_string();
        env.insert("JOB_NAME".to_string(), version.clone());
        args.push(version);
    }
    if command == DelegatedCommand::Shell {
        args.extend(inputs.shell_args.split_whitespace().map(str::to_string));
    }

    let path = search_path
        .into_string()
        .map_err(|_| Error::configuration("search path is not valid UTF-8"))?;
    // Windows spells it `Path`; the child must see exactly one entry.
    env.retain(|key, _| !key.eq_ignore_ascii_case("PATH"));
    env.insert("PATH".to_string(), path);

    Ok(CommandSpec { program, args, env })
}

/// Runs an assembled command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` and return its exit code.
    async fn run(&self, spec: &CommandSpec) -> Result<i32>;
}

/// Runs commands as child processes sharing this process's stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<i32> {
        let status = tokio::process::Command::new(&spec.program)
            .args(&spec.args)
            .env_clear()
            .envs(&spec.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        // No code means the child was killed by a signal.
        Ok(status.code().unwrap_or(1))
    }
}

/// Runs `cdflow2` found through the registered search path.
pub struct Dispatcher<'a> {
    runner: &'a dyn CommandRunner,
    paths: &'a PathRegistry,
    app_version: &'a AppVersion<'a>,
    executable_name: String,
}

impl<'a> Dispatcher<'a> {
    /// `executable_name` is the platform leaf name of `cdflow2`.
    #[must_use]
    pub fn new(
        runner: &'a dyn CommandRunner,
        paths: &'a PathRegistry,
        app_version: &'a AppVersion<'a>,
        executable_name: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            paths,
            app_version,
            executable_name: executable_name.into(),
        }
    }

    /// Run `command`, or do nothing when there is none.
    ///
    /// # Errors
    ///
    /// Returns an install error if `cdflow2` is not on the registered search
    /// path, a configuration error for incomplete inputs, and a command
    /// failure carrying the exit code when `cdflow2` fails.
    pub async fn dispatch(
        &self,
        command: Option<DelegatedCommand>,
        inputs: &DispatchInputs,
    ) -> Result<()> {
        let Some(command) = command else {
            info!("No command given, {TOOL} is installed and on the path");
            return Ok(());
        };

        let program = self.paths.find_executable(&self.executable_name).ok_or_else(|| {
            Error::install(
                Path::new(&self.executable_name),
                "not found in any registered directory",
            )
        })?;
        let search_path = self
            .paths
            .search_path(std::env::var_os("PATH").as_deref())?;

        let spec = build_command_spec(
            program,
            command,
            inputs,
            self.app_version,
            std::env::vars_os(),
            search_path,
        )?;

        debug!(program = %spec.program.display(), args = ?spec.args, "Running {TOOL}");
        let code = self.runner.run(&spec).await?;
        if code != 0 {
            return Err(Error::command_failure(TOOL, code));
        }
        info!(%command, "{TOOL} {command} completed");
        Ok(())
    }
}
