//! One action run: validate, acquire `cdflow2`, then dispatch.

use crate::cli::{Cli, CliError};
use crate::dispatch::{CommandRunner, DelegatedCommand, Dispatcher, ProcessRunner, TOOL};
use cdflow_action_ci::{AppVersion, RunContext, WorkflowCommands};
use cdflow_action_core::tools::{
    CacheKey, PathRegistry, PlatformIdentity, ToolCache, ToolInstaller, ToolProvider,
    default_cache_dir,
};
use cdflow_action_tools_github::GitHubReleaseProvider;
use tracing::{info, instrument};

/// Run the action with `cdflow2` executed as a child process.
///
/// # Errors
///
/// See [`run_with_runner`].
pub async fn run(cli: Cli) -> Result<(), CliError> {
    run_with_runner(cli, &ProcessRunner).await
}

/// Run the action, handing the assembled command to `runner`.
///
/// Inputs are validated before any network access. Acquisition always runs,
/// even without a command.
///
/// # Errors
///
/// Returns a configuration error for invalid inputs, an acquisition error if
/// `cdflow2` cannot be installed, and a command error when it fails.
#[instrument(name = "cdflow_action", skip_all, fields(command = %cli.command))]
pub async fn run_with_runner(cli: Cli, runner: &dyn CommandRunner) -> Result<(), CliError> {
    let command = DelegatedCommand::parse(&cli.command)?;
    let inputs = cli.dispatch_inputs();
    if let Some(command) = command {
        inputs.validate(command)?;
    }
    let request = cli.version_request()?;

    let platform = PlatformIdentity::current();
    let provider = GitHubReleaseProvider::new(cli.release_source())?;
    let version = provider.resolve_version(&request).await?;
    info!(%version, %platform, "Installing {TOOL}");

    let cache = ToolCache::new(cli.tool_cache_dir.clone().unwrap_or_else(default_cache_dir));
    let key = CacheKey::new(TOOL, version, platform);
    let mut paths = PathRegistry::new();
    let installed = ToolInstaller::new(&cache, &provider)
        .ensure_tool(&key, &mut paths)
        .await?;

    let commands = WorkflowCommands::from_env();
    for dir in paths.iter() {
        commands.add_path(dir)?;
    }
    info!(
        executable = %installed.executable.display(),
        cache_hit = installed.cache_hit,
        "{TOOL} {} ready", key.version
    );

    let app_version = AppVersion::new(cli.app_version.clone(), RunContext::from_env(), &commands);
    Dispatcher::new(runner, &paths, &app_version, key.executable_name())
        .dispatch(command, &inputs)
        .await?;
    Ok(())
}
