//! cdflow-action: bootstrap `cdflow2` on a CI runner and delegate to it.
//!
//! The binary resolves the requested `cdflow2` release, installs the platform
//! executable into a persistent tool cache, publishes it on the search path
//! and optionally runs one `cdflow2` command with arguments assembled from
//! the action inputs.

pub mod cli;
pub mod dispatch;
pub mod runner;
pub mod tracing;

pub use cli::{Cli, CliError, EXIT_ACQUISITION, EXIT_CLI, EXIT_OK, exit_code_for};
pub use dispatch::{
    CommandRunner, CommandSpec, DelegatedCommand, DispatchInputs, Dispatcher, ProcessRunner,
};
