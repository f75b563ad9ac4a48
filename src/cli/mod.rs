//! Command line interface for the distribution pipeline.
//!
//! Parses arguments, builds the run's reporter, and hands the chosen
//! subcommand to the pipeline.

pub mod args;
pub mod output;

pub use args::{Args, Command};
pub use output::OutputManager;

use crate::error::Result;
use crate::pipeline;

/// Main CLI entry point
pub fn run() -> Result<i32> {
    let args = Args::parse_args();
    let output = OutputManager::new(args.color, args.verbose);
    pipeline::run(&args, &output)?;
    Ok(0)
}
