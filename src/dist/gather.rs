//! Tracked-file gathering for staging and the manifest.
//!
//! The canonical source is the version-control file listing; projects that
//! are not under version control fall back to a filesystem walk.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;
use crate::exec::Runner;
use crate::workdir::SCRATCH_DIR;

/// Gather the project's tracked files, relative to `root`.
///
/// `git ls-files` is authoritative when it succeeds; otherwise every regular
/// file outside hidden directories and the scratch root is listed, in path
/// order.
pub fn gather(root: &Path, runner: &Runner<'_>) -> Result<Vec<PathBuf>> {
    match git_listing(root, runner) {
        Some(files) => Ok(files),
        None => {
            log::debug!("no version-control listing; walking {}", root.display());
            walk_listing(root)
        }
    }
}

fn git_listing(root: &Path, runner: &Runner<'_>) -> Option<Vec<PathBuf>> {
    let output = runner
        .capture("git", &["-C", &root.display().to_string(), "ls-files"])
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let files: Vec<PathBuf> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect();
    if files.is_empty() {
        // An enclosing unrelated repository tracks nothing under this root;
        // an empty successful listing counts as no listing.
        return None;
    }
    Some(files)
}

fn walk_listing(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(name.starts_with('.') && entry.path() != root) && name != SCRATCH_DIR
        });
    for entry in walker {
        let entry = entry.map_err(|e| crate::error::DistError::Generic(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| crate::error::DistError::Generic(e.to_string()))?;
        files.push(rel.to_path_buf());
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_skips_hidden_dirs_and_the_scratch_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::create_dir_all(dir.path().join(SCRATCH_DIR)).unwrap();
        std::fs::write(dir.path().join("lib/a.mod"), b"a").unwrap();
        std::fs::write(dir.path().join("Changes"), b"c").unwrap();
        std::fs::write(dir.path().join(".git/config"), b"g").unwrap();
        std::fs::write(dir.path().join(SCRATCH_DIR).join("junk"), b"j").unwrap();

        let files = walk_listing(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("Changes"), PathBuf::from("lib/a.mod")]
        );
    }

    #[test]
    fn empty_git_listing_falls_back_to_the_walk() {
        use crate::cli::output::{ColorPreference, OutputManager};

        if which::which("git").is_err() {
            return;
        }
        // An enclosing repository that tracks nothing under the project root.
        let outer = tempfile::tempdir().unwrap();
        let init = std::process::Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(outer.path())
            .status();
        if !init.map(|s| s.success()).unwrap_or(false) {
            return;
        }
        let project = outer.path().join("project");
        std::fs::create_dir_all(project.join("lib")).unwrap();
        std::fs::write(project.join("lib/a.mod"), b"a").unwrap();
        std::fs::write(project.join("Changes"), b"c").unwrap();

        let output = OutputManager::new(ColorPreference::Never, false);
        let runner = Runner::new(&output);
        let files = gather(&project, &runner).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("Changes"), PathBuf::from("lib/a.mod")]
        );
    }
}
