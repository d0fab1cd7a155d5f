//! Integration tests for reading the GitHub Actions runner environment.
//!
//! These exercise the environment-driven constructors against the files and
//! variables a hosted runner provides.

use cdflow_action_ci::{AppVersion, OutputSink, RunContext, WorkflowCommands};
use std::path::Path;
use tempfile::TempDir;

/// App version synthesis from a full runner environment.
mod app_version_from_env {
    use super::*;

    #[test]
    fn synthesizes_from_runner_variables_and_writes_output_file() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("github_output");
        let output_str = output.to_str().unwrap();

        temp_env::with_vars(
            [
                ("GITHUB_REPOSITORY", Some("mergermarket/my-app")),
                ("GITHUB_RUN_NUMBER", Some("17")),
                ("GITHUB_RUN_ATTEMPT", Some("3")),
                ("GITHUB_SHA", Some("0123456789abcdef")),
                ("GITHUB_OUTPUT", Some(output_str)),
            ],
            || {
                let commands = WorkflowCommands::from_env();
                let app_version = AppVersion::new(None, RunContext::from_env(), &commands);

                assert_eq!(app_version.get(), "mergermarket_my-app-17-3-0123456789abcdef");
                // Second read must not publish again.
                app_version.get();
            },
        );

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content.matches("appVersion<<").count(), 1);
        assert!(content.contains("\nmergermarket_my-app-17-3-0123456789abcdef\n"));
    }

    #[test]
    fn missing_variables_render_as_undefined() {
        let temp = TempDir::new().unwrap();
        let sink = WorkflowCommands {
            output_file: Some(temp.path().join("output")),
            path_file: None,
        };

        temp_env::with_vars_unset(
            [
                "GITHUB_REPOSITORY",
                "GITHUB_RUN_NUMBER",
                "GITHUB_RUN_ATTEMPT",
                "GITHUB_SHA",
            ],
            || {
                let app_version = AppVersion::new(None, RunContext::from_env(), &sink);
                assert_eq!(
                    app_version.get(),
                    "undefined-undefined-undefined-undefined"
                );
            },
        );
    }
}

/// Environment file discovery.
mod workflow_commands_from_env {
    use super::*;

    #[test]
    fn empty_variables_are_ignored() {
        temp_env::with_vars(
            [("GITHUB_OUTPUT", Some("")), ("GITHUB_PATH", Some(""))],
            || {
                assert_eq!(WorkflowCommands::from_env(), WorkflowCommands::default());
            },
        );
    }

    #[test]
    fn publishes_paths_and_outputs_to_runner_files() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("output");
        let path = temp.path().join("path");

        temp_env::with_vars(
            [
                ("GITHUB_OUTPUT", Some(output.to_str().unwrap())),
                ("GITHUB_PATH", Some(path.to_str().unwrap())),
            ],
            || {
                let commands = WorkflowCommands::from_env();
                commands.set_output("appVersion", "v1").unwrap();
                assert!(commands.add_path(Path::new("/tools/cdflow2")).unwrap());
            },
        );

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "/tools/cdflow2\n");
        assert!(std::fs::read_to_string(&output).unwrap().contains("\nv1\n"));
    }
}
