//! Command line argument parsing and validation.
//!
//! Subcommands map one-to-one onto pipeline entry points; global flags
//! control color, debug retention of the scratch root, verbosity, and the
//! auto-install policy.

use clap::{Parser, Subcommand};

use super::output::ColorPreference;

/// Build-and-release orchestrator for source-library distributions
#[derive(Parser, Debug)]
#[command(
    name = "distkit",
    version,
    about = "Build-and-release orchestrator for source-library distributions",
    long_about = "Verifies prerequisites, stages an isolated working copy, generates the \
build script, metadata descriptors, manifest and distribution archive, and optionally \
tests and uploads the result.

Usage:
  distkit new My::Library
  distkit test
  distkit dist --no-test
  distkit release

Exit code 0 = the requested pipeline completed."
)]
pub struct Args {
    /// When to color status output
    #[arg(long, global = true, value_enum, default_value_t = ColorPreference::Auto)]
    pub color: ColorPreference,

    /// Keep the scratch root around after the run for inspection
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print additional progress detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not invoke the external installer for missing packages
    #[arg(long = "no-install", global = true)]
    pub no_install: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scaffold a new project directory
    New {
        /// Primary module name, e.g. My::Library
        module: String,
    },

    /// Verify dependencies, stage a working copy, and run the test suite
    Test,

    /// Build the distribution archive
    Dist {
        #[command(flatten)]
        test: TestToggle,
    },

    /// Build the archive and hand it to the external installer
    Install {
        #[command(flatten)]
        test: TestToggle,

        /// Keep the archive after a successful install
        #[arg(long)]
        keep_archive: bool,
    },

    /// Bump the version, build and test, and upload to the registry
    Release {
        #[command(flatten)]
        test: TestToggle,
    },
}

/// `--test` / `--no-test` pair shared by dist, install and release.
#[derive(clap::Args, Debug, Default)]
pub struct TestToggle {
    /// Run the test suite before packaging (default)
    #[arg(long = "test", overrides_with = "no_test")]
    pub test: bool,

    /// Skip the test suite
    #[arg(long = "no-test")]
    pub no_test: bool,
}

impl TestToggle {
    /// Testing is on unless `--no-test` won the flag pair.
    pub fn enabled(&self) -> bool {
        !self.no_test
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Auto-install policy: on unless `--no-install` was given.
    pub fn auto_install(&self) -> bool {
        !self.no_install
    }
}
