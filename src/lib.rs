//! Build-and-release orchestrator for source-library distributions.
//!
//! Given a source tree, a declarative project descriptor and a dependency
//! manifest, this library verifies prerequisites, stages an isolated working
//! copy, generates the derived build artifacts (build script, metadata
//! descriptors, manifest, compressed archive), optionally runs the test
//! suite, and optionally hands the archive to the external registry
//! uploader.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod dist;
pub mod error;
pub mod exec;
pub mod pipeline;
pub mod plugin;
pub mod prereqs;
pub mod verify;
pub mod workdir;

// Re-export commonly used types
pub use error::{DistError, Result};
