//! cdflow-action binary
//!
//! Installs the requested `cdflow2` release on the runner and optionally runs
//! one `cdflow2` command. Exit codes: 0 on success, 1 when `cdflow2` cannot
//! be installed, 2 for invalid inputs, otherwise the exit code of `cdflow2`.

// CLI binary needs to output to stderr before tracing is up
#![allow(clippy::print_stderr)]

use cdflow_action::cli::{Cli, CliError, EXIT_OK, exit_code_for, render_error};
use cdflow_action::runner;
use cdflow_action::tracing::init_tracing;
use clap::Parser;
use clap::error::ErrorKind;

fn main() {
    // NOTE: tracing may be unusable during a panic, so write directly.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Re-run with RUNNER_DEBUG=1 for more information.");
    }));

    let exit_code = run_with_tokio();
    std::process::exit(exit_code);
}

/// Create tokio runtime and run async path
fn run_with_tokio() -> i32 {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return 1;
        }
    };

    rt.block_on(run())
}

async fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => e.exit(),
        Err(e) => {
            let err = CliError::config(e.to_string().trim_end());
            render_error(&err);
            return exit_code_for(&err);
        }
    };

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("Warning: {e}");
    }

    match runner::run(cli).await {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err);
            exit_code_for(&err)
        }
    }
}
