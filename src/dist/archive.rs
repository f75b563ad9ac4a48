//! Compressed distribution archive creation.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::Result;

/// Build `<dist_name>.tar.gz` in `dest_dir` from the manifested files.
///
/// Entry contents are read relative to the current (staged) working
/// directory; every entry is prefixed with `<dist_name>/`. A pre-existing
/// archive of the same name is removed first.
pub fn build(manifest: &[PathBuf], dist_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let archive_path = dest_dir.join(format!("{dist_name}.tar.gz"));
    if archive_path.exists() {
        log::debug!("removing stale archive {}", archive_path.display());
        std::fs::remove_file(&archive_path)?;
    }

    let file = File::create(&archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for rel in manifest {
        builder.append_path_with_name(rel, Path::new(dist_name).join(rel))?;
    }
    builder.into_inner()?.finish()?;

    log::info!("wrote {}", archive_path.display());
    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use serial_test::serial;
    use std::collections::BTreeSet;

    #[test]
    #[serial]
    fn archive_round_trips_the_manifested_files() {
        let staging = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(staging.path().join("lib")).unwrap();
        std::fs::write(staging.path().join("lib/a.mod"), b"alpha").unwrap();
        std::fs::write(staging.path().join("Changes"), b"log").unwrap();

        let manifest = vec![PathBuf::from("lib/a.mod"), PathBuf::from("Changes")];
        let guard = crate::workdir::DirGuard::enter(staging.path()).unwrap();
        let archive = build(&manifest, "Demo-v1.0.0", dest.path()).unwrap();
        drop(guard);

        let mut seen = BTreeSet::new();
        let tar = GzDecoder::new(File::open(&archive).unwrap());
        for entry in tar::Archive::new(tar).entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_path_buf();
            seen.insert(path.clone());
            if path == Path::new("Demo-v1.0.0/lib/a.mod") {
                let mut body = Vec::new();
                std::io::Read::read_to_end(&mut entry, &mut body).unwrap();
                assert_eq!(body, b"alpha");
            }
        }
        let expected: BTreeSet<PathBuf> = [
            PathBuf::from("Demo-v1.0.0/lib/a.mod"),
            PathBuf::from("Demo-v1.0.0/Changes"),
        ]
        .into();
        assert_eq!(seen, expected);
    }

    #[test]
    #[serial]
    fn stale_archive_is_replaced() {
        let staging = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(staging.path().join("Changes"), b"log").unwrap();
        let stale = dest.path().join("Demo-v1.0.0.tar.gz");
        std::fs::write(&stale, b"not a tarball").unwrap();

        let guard = crate::workdir::DirGuard::enter(staging.path()).unwrap();
        let archive = build(&[PathBuf::from("Changes")], "Demo-v1.0.0", dest.path()).unwrap();
        drop(guard);

        assert_eq!(archive, stale);
        let tar = GzDecoder::new(File::open(&archive).unwrap());
        assert_eq!(tar::Archive::new(tar).entries().unwrap().count(), 1);
    }
}
