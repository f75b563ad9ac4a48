//! External subprocess execution with fatal-on-failure semantics.
//!
//! Every invocation is logged and echoed as a progress line. Commands run
//! with inherited standard streams; a non-zero exit is reported to the user
//! and surfaces as [`DistError::AlreadyReported`], aborting the run.

use std::process::{Command, Output, Stdio};

use crate::cli::output::OutputManager;
use crate::error::{DistError, Result};

/// Blocking subprocess runner tied to the run's reporter.
#[derive(Clone, Copy, Debug)]
pub struct Runner<'a> {
    output: &'a OutputManager,
}

impl<'a> Runner<'a> {
    pub fn new(output: &'a OutputManager) -> Self {
        Self { output }
    }

    /// Run an argv with inherited streams; non-zero exit aborts the run.
    ///
    /// `envs` are extra environment variables for the child only.
    pub fn run(&self, argv: &[String], envs: &[(&str, &str)]) -> Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(DistError::Config {
                reason: "empty command".to_string(),
            });
        };
        let rendered = argv.join(" ");
        log::info!("running: {rendered}");
        self.output.progress(&rendered);

        let status = Command::new(program)
            .args(args)
            .envs(envs.iter().copied())
            .status()
            .map_err(|e| {
                self.output
                    .error(&format!("failed to launch `{program}`: {e}"));
                DistError::AlreadyReported
            })?;

        if !status.success() {
            self.output
                .error(&format!("`{rendered}` failed with {status}"));
            return Err(DistError::AlreadyReported);
        }
        Ok(())
    }

    /// Run a command capturing its output, for collaborator queries.
    ///
    /// Launch failures and non-zero exits are the caller's to interpret;
    /// nothing is printed.
    pub fn capture(&self, program: &str, args: &[&str]) -> std::io::Result<Output> {
        log::debug!("capturing: {program} {}", args.join(" "));
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
    }
}

/// Split a configured command string into an argv on whitespace.
///
/// Command overrides in the project descriptor are plain argv strings, not
/// shell snippets; quoting is deliberately not interpreted.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::ColorPreference;

    #[test]
    fn split_command_on_whitespace() {
        assert_eq!(split_command("make test"), vec!["make", "test"]);
        assert_eq!(split_command("  one  "), vec!["one"]);
        assert!(split_command("").is_empty());
    }

    #[test]
    fn empty_argv_is_a_config_error() {
        let output = OutputManager::new(ColorPreference::Never, false);
        let runner = Runner::new(&output);
        assert!(matches!(
            runner.run(&[], &[]),
            Err(DistError::Config { .. })
        ));
    }

    #[test]
    fn failing_command_is_already_reported() {
        let output = OutputManager::new(ColorPreference::Never, false);
        let runner = Runner::new(&output);
        let argv = vec!["distkit-no-such-binary".to_string()];
        assert!(matches!(
            runner.run(&argv, &[]),
            Err(DistError::AlreadyReported)
        ));
    }
}
