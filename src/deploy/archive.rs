//! Zip extraction.
use std::fs::File;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::DeployError;

/// Extract every entry of `archive` below `dest`.
///
/// Entries whose names would escape `dest` (absolute paths, `..`) are
/// skipped.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or an entry cannot be
/// written.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<(), DeployError> {
    let bad_archive = |reason: String| DeployError::Archive {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive).map_err(|e| DeployError::io("open", archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| bad_archive(e.to_string()))?;
    std::fs::create_dir_all(dest).map_err(|e| DeployError::io("mkdir", dest, e))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| bad_archive(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| DeployError::io("mkdir", &target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DeployError::io("mkdir", parent, e))?;
        }
        let mut out = File::create(&target).map_err(|e| DeployError::io("create", &target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| DeployError::io("extract", &target, e))?;
    }
    Ok(())
}

/// Return the single top-level directory of an extracted archive, or `dir`
/// itself when the archive has several top-level entries.
///
/// GitHub branch archives wrap everything in `<repo>-<branch>/`.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn single_root(dir: &Path) -> Result<PathBuf, DeployError> {
    let entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| DeployError::io("read", dir, e))?
        .filter_map(Result::ok)
        .collect();
    match entries.as_slice() {
        [only] if only.path().is_dir() => Ok(only.path()),
        _ => Ok(dir.to_path_buf()),
    }
}
