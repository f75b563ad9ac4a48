//! Built-in plugin that prunes files from the staged working copy.
//!
//! Configured as:
//!
//! ```toml
//! [PruneFiles]
//! patterns = ["*.bak", "notes/**/*.draft"]
//! ```
//!
//! Each pattern is a glob evaluated relative to the staging directory when
//! the after-stage hook fires; matching files are removed from the copy and
//! therefore never reach the manifest or the archive.

use super::{HookBus, Plugin, AFTER_STAGE};
use crate::error::Result;
use crate::pipeline::Build;

pub struct PruneFiles;

impl Plugin for PruneFiles {
    fn init(&self, _build: &mut Build, hooks: &mut HookBus, payload: &toml::Value) -> Result<()> {
        let patterns: Vec<String> = payload
            .get("patterns")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        if patterns.is_empty() {
            log::warn!("PruneFiles configured without patterns");
        }

        hooks.add(
            AFTER_STAGE,
            Box::new(move |_build, _args| {
                for pattern in &patterns {
                    let paths = glob::glob(pattern)
                        .map_err(|e| crate::error::DistError::Config {
                            reason: format!("PruneFiles pattern `{pattern}`: {e}"),
                        })?;
                    for entry in paths {
                        let path = match entry {
                            Ok(path) => path,
                            Err(e) => {
                                log::warn!("PruneFiles skipping unreadable match: {e}");
                                continue;
                            }
                        };
                        if path.is_file() {
                            log::debug!("pruning {}", path.display());
                            std::fs::remove_file(&path)?;
                        }
                    }
                }
                Ok(())
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn prunes_matching_files_on_after_stage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"keep").unwrap();
        std::fs::write(dir.path().join("drop.bak"), b"drop").unwrap();

        let mut build = Build::for_tests();
        let mut hooks = HookBus::default();
        let payload: toml::Value = toml::from_str("patterns = [\"*.bak\"]").unwrap();
        PruneFiles.init(&mut build, &mut hooks, &payload).unwrap();

        // Globs are relative to the staging directory, i.e. the cwd.
        let guard = crate::workdir::DirGuard::enter(dir.path()).unwrap();
        hooks.fire(AFTER_STAGE, &mut build, &[]).unwrap();
        drop(guard);

        assert!(dir.path().join("keep.txt").exists());
        assert!(!dir.path().join("drop.bak").exists());
    }
}
