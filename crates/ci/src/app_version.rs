//! App version identifier for release, deploy and destroy runs.

use crate::commands::OutputSink;
use crate::context::RunContext;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Step output carrying the app version.
pub const APP_VERSION_OUTPUT: &str = "appVersion";

/// Separator between the run context fields of a synthesized app version.
pub const DELIMITER: &str = "-";

const UNDEFINED: &str = "undefined";

/// Build `<repository with "/" as "_">-<run number>-<run attempt>-<sha>`.
///
/// Missing fields are rendered as `undefined`.
#[must_use]
pub fn synthesize(context: &RunContext) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| UNDEFINED.to_string());
    [
        field(&context.repository).replace('/', "_"),
        field(&context.run_number),
        field(&context.run_attempt),
        field(&context.sha),
    ]
    .join(DELIMITER)
}

/// Lazily computed app version, published as a step output on first use.
pub struct AppVersion<'a> {
    override_value: Option<String>,
    context: RunContext,
    sink: &'a dyn OutputSink,
    value: OnceLock<String>,
}

impl<'a> AppVersion<'a> {
    /// An empty `override_value` counts as absent.
    #[must_use]
    pub fn new(
        override_value: Option<String>,
        context: RunContext,
        sink: &'a dyn OutputSink,
    ) -> Self {
        Self {
            override_value: override_value.filter(|value| !value.is_empty()),
            context,
            sink,
            value: OnceLock::new(),
        }
    }

    /// The app version for this run.
    ///
    /// The first call computes and publishes the value; later calls return
    /// it unchanged.
    pub fn get(&self) -> &str {
        self.value.get_or_init(|| {
            let value = match &self.override_value {
                Some(value) => value.clone(),
                None => {
                    let value = synthesize(&self.context);
                    info!(app_version = %value, "Generated app version \"{value}\"");
                    value
                }
            };
            if let Err(e) = self.sink.set_output(APP_VERSION_OUTPUT, &value) {
                warn!(error = %e, "Failed to publish {APP_VERSION_OUTPUT} output");
            }
            value
        })
    }

    /// Whether the value has been computed yet.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }
}
