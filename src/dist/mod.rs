//! Artifact generation for the dist-building sequence.
//!
//! Produces the build script, both metadata descriptors, the license text,
//! the manifest, and finally the compressed archive. Everything except the
//! archive is written into the staged working copy; the archive lands in the
//! project root.

pub mod archive;
pub mod gather;
pub mod license;
pub mod meta;
pub mod script;

pub use gather::gather;
pub use meta::GENERATOR;

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::prereqs::Prereqs;

/// Manifest filename.
pub const MANIFEST_FILE: &str = "MANIFEST";

/// Filenames generated into the working copy, in manifest order.
pub const GENERATED_FILES: [&str; 5] = [
    script::BUILD_SCRIPT,
    license::LICENSE_FILE,
    meta::META_JSON,
    meta::META_YML,
    MANIFEST_FILE,
];

/// Generate the build script, license, descriptors and manifest into the
/// current (staged) working directory.
///
/// Returns the manifest: every gathered file in its original order followed
/// by the generated filenames. Gathered entries that collide with generated
/// names are dropped in favor of the fresh copies.
pub fn generate(
    files: &[PathBuf],
    config: &ProjectConfig,
    prereqs: &Prereqs,
) -> Result<Vec<PathBuf>> {
    let here = Path::new(".");
    script::write(here, config, prereqs, GENERATOR)?;
    license::write(here, &config.license, config.copyright_holder())?;
    meta::write(here, config, prereqs)?;

    let mut manifest: Vec<PathBuf> = files
        .iter()
        .filter(|path| {
            !GENERATED_FILES
                .iter()
                .any(|generated| path.as_path() == Path::new(generated))
        })
        .filter(|path| {
            // Plugins may have pruned gathered files from the staged copy.
            let staged = path.is_file();
            if !staged {
                log::debug!("{} not present in the staged copy", path.display());
            }
            staged
        })
        .cloned()
        .collect();
    manifest.extend(GENERATED_FILES.iter().map(PathBuf::from));
    write_manifest(here, &manifest)?;
    Ok(manifest)
}

/// Write the manifest file, one path per line.
pub fn write_manifest(dir: &Path, manifest: &[PathBuf]) -> Result<()> {
    let mut out = std::fs::File::create(dir.join(MANIFEST_FILE))?;
    for path in manifest {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}

/// Copy the artifacts that persist after packaging (build script and
/// license) from the staging directory back into the project root.
pub fn persist(staging: &Path, root: &Path) -> Result<()> {
    for name in [script::BUILD_SCRIPT, license::LICENSE_FILE] {
        crate::workdir::copy_file(&staging.join(name), &root.join(name))?;
    }
    Ok(())
}
