//! Isolated staging directories under the project's scratch root.
//!
//! Each run owns exactly one freshly created staging directory beneath
//! `.build/`; leftovers from interrupted runs are reclaimed before a new one
//! is created. Directory-context changes go through [`DirGuard`], which
//! restores the original working directory on every exit path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Hidden scratch root under the project directory.
pub const SCRATCH_DIR: &str = ".build";

/// Auxiliary subdirectory for extended tests, ensured after staging.
pub const EXTENDED_TESTS_DIR: &str = "xt";

/// A freshly staged working copy.
#[derive(Debug)]
pub struct WorkDir {
    /// The scratch root, shared by all runs of this project.
    pub scratch: PathBuf,
    /// This run's staging directory.
    pub dir: PathBuf,
}

/// Scoped "change directory, restore on exit".
///
/// Acquisition records the current working directory and changes into the
/// target; dropping the guard restores the original directory whether the
/// enclosing operation succeeded or failed.
#[derive(Debug)]
pub struct DirGuard {
    original: PathBuf,
}

impl DirGuard {
    pub fn enter(target: &Path) -> Result<Self> {
        let original = std::env::current_dir()?;
        std::env::set_current_dir(target)?;
        log::debug!("entered {}", target.display());
        Ok(Self { original })
    }

    /// The directory that will be restored on drop.
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.original) {
            // Nothing more we can do mid-unwind; surface it loudly.
            log::error!(
                "failed to restore working directory {}: {e}",
                self.original.display()
            );
        }
    }
}

/// Stage `files` (paths relative to `base`) into a fresh staging directory.
///
/// Reclaims any prior scratch-root children first, then copies each listed
/// file preserving its relative path. Directories in the list are skipped;
/// intermediate directories are created as needed. The extended-tests
/// subdirectory is ensured to exist afterwards.
pub fn stage(files: &[PathBuf], base: &Path) -> Result<WorkDir> {
    let scratch = base.join(SCRATCH_DIR);
    reclaim(&scratch)?;
    fs::create_dir_all(&scratch)?;

    let dir = tempfile::Builder::new()
        .prefix("stage-")
        .tempdir_in(&scratch)?
        .keep();
    log::info!("staging {} files into {}", files.len(), dir.display());

    for rel in files {
        let src = base.join(rel);
        if src.is_dir() {
            continue;
        }
        copy_file(&src, &dir.join(rel))?;
    }

    fs::create_dir_all(dir.join(EXTENDED_TESTS_DIR))?;
    Ok(WorkDir { scratch, dir })
}

/// Remove every child of the scratch root, treating them as leftovers from
/// interrupted prior runs. Missing root is fine.
pub fn reclaim(scratch: &Path) -> Result<()> {
    let entries = match fs::read_dir(scratch) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        log::debug!("reclaiming leftover {}", path.display());
        if entry.file_type()?.is_dir() {
            remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Remove the entire scratch root once the top-level command completes.
pub fn cleanup(base: &Path) -> Result<()> {
    remove_dir_all(&base.join(SCRATCH_DIR))
}

/// Removes the directory and its contents if it exists.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e.into()),
    }
}

/// Copies a regular file, creating any parent directories of the destination
/// path as necessary. Fails if the source is a directory or doesn't exist.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        crate::bail!("{} does not exist", from.display());
    }
    if !from.is_file() {
        crate::bail!("{} is not a file", from.display());
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)?;
    }
    fs::copy(from, to)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib/My")).unwrap();
        fs::write(dir.path().join("lib/My/Lib.mod"), b"module body\n").unwrap();
        fs::write(dir.path().join("Changes"), b"v0.1.0 first\n").unwrap();
        dir
    }

    #[test]
    fn staging_reproduces_listed_files_byte_for_byte() {
        let base = fixture();
        let files = vec![
            PathBuf::from("lib/My/Lib.mod"),
            PathBuf::from("Changes"),
            PathBuf::from("lib"), // directory: skipped
        ];
        let work = stage(&files, base.path()).unwrap();
        assert_eq!(
            fs::read(work.dir.join("lib/My/Lib.mod")).unwrap(),
            b"module body\n"
        );
        assert_eq!(fs::read(work.dir.join("Changes")).unwrap(), b"v0.1.0 first\n");
        assert!(work.dir.join(EXTENDED_TESTS_DIR).is_dir());
    }

    #[test]
    fn restaging_removes_prior_scratch_children() {
        let base = fixture();
        let files = vec![PathBuf::from("Changes")];
        let first = stage(&files, base.path()).unwrap();
        assert!(first.dir.exists());
        // A stray file in the root counts as a leftover too.
        fs::write(first.scratch.join("stray"), b"x").unwrap();

        let second = stage(&files, base.path()).unwrap();
        assert!(!first.dir.exists());
        assert!(!second.scratch.join("stray").exists());
        assert!(second.dir.exists());

        let children: Vec<_> = fs::read_dir(&second.scratch).unwrap().collect();
        assert_eq!(children.len(), 1);
    }

    #[test]
    #[serial]
    fn guard_restores_working_directory_on_drop() {
        let base = fixture();
        let before = std::env::current_dir().unwrap();
        {
            let guard = DirGuard::enter(base.path()).unwrap();
            assert_eq!(guard.original(), before);
            assert_ne!(std::env::current_dir().unwrap(), before);
        }
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn guard_restores_working_directory_on_unwind() {
        let base = fixture();
        let before = std::env::current_dir().unwrap();
        let target = base.path().to_path_buf();
        let result = std::panic::catch_unwind(move || {
            let _guard = DirGuard::enter(&target).unwrap();
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn cleanup_removes_the_whole_scratch_root() {
        let base = fixture();
        stage(&[PathBuf::from("Changes")], base.path()).unwrap();
        assert!(base.path().join(SCRATCH_DIR).exists());
        cleanup(base.path()).unwrap();
        assert!(!base.path().join(SCRATCH_DIR).exists());
        // Idempotent when the root is already gone.
        cleanup(base.path()).unwrap();
    }
}
