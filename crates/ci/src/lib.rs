//! GitHub Actions integration for cdflow-action.
//!
//! - [`RunContext`] - repository and run identifiers of the current job
//! - [`AppVersion`] - the memoized app version identifier
//! - [`WorkflowCommands`] - step outputs, search path publishing and annotations

pub mod app_version;
pub mod commands;
pub mod context;

pub use app_version::{APP_VERSION_OUTPUT, AppVersion, DELIMITER, synthesize};
pub use commands::{OutputSink, WorkflowCommands, escape_data};
pub use context::RunContext;

pub use cdflow_action_core::{Error, Result};
