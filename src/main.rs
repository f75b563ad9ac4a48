//! distkit - build-and-release orchestrator for source-library distributions.

use std::process;

use distkit::DistError;

fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match distkit::cli::run() {
        Ok(code) => code,
        // A diagnostic was already printed for this one.
        Err(DistError::AlreadyReported) => 1,
        Err(e) => {
            eprintln!("Error: {e}");
            2
        }
    };

    process::exit(exit_code);
}
