//! Place extracted files into destination directories without losing
//! anything already there.
//!
//! Each file is handled on its own:
//!
//! | destination            | `overwrite = false` | `overwrite = true`        |
//! |------------------------|---------------------|---------------------------|
//! | absent                 | `COPY`              | `COPY`                    |
//! | present                | `SKIP` (untouched)  | back up, then `OVRW`      |
//!
//! Backups go to a sibling `<dest>Backup_<timestamp>` directory created on
//! the first overwrite (see [`BackupDir`]).
pub mod archive;
pub mod backup;

use std::fmt;
use std::path::{Path, PathBuf};

pub use archive::{extract_zip, single_root};
pub use backup::{BackupDir, backup_name};

use crate::error::DeployError;
use crate::logging::Log;

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The destination did not exist; the file was copied.
    Copy,
    /// The destination exists and overwriting is off; left untouched.
    Skip,
    /// The destination was backed up and then replaced.
    Overwrite,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Copy => "COPY",
            Self::Skip => "SKIP",
            Self::Overwrite => "OVRW",
        })
    }
}

/// Outcome of one deployment call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Files copied to a fresh destination.
    pub copied: usize,
    /// Files left alone because they already existed.
    pub skipped: usize,
    /// Files replaced after being backed up.
    pub overwritten: usize,
    /// Backup directory, if any file was overwritten.
    pub backup: Option<PathBuf>,
}

impl DeployReport {
    fn record(&mut self, action: Action) {
        match action {
            Action::Copy => self.copied += 1,
            Action::Skip => self.skipped += 1,
            Action::Overwrite => self.overwritten += 1,
        }
    }
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} copied, {} skipped, {} overwritten",
            self.copied, self.skipped, self.overwritten
        )
    }
}

/// Deploy the immediate files of `source` into `dest`.
///
/// Subdirectories of `source` and files named in `exclude` are ignored.
///
/// # Errors
///
/// Returns an error on the first file that cannot be copied or backed up.
/// Files handled before the failure stay in place.
pub fn deploy(
    source: &Path,
    dest: &Path,
    overwrite: bool,
    exclude: &[&str],
    log: &dyn Log,
) -> Result<DeployReport, DeployError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(source).map_err(|e| DeployError::io("read", source, e))? {
        let entry = entry.map_err(|e| DeployError::io("read", source, e))?;
        let path = entry.path();
        let name = entry.file_name();
        if path.is_file() && !exclude.iter().any(|x| name == *x) {
            files.push(PathBuf::from(name));
        }
    }
    files.sort();
    place_all(source, dest, &files, overwrite, log)
}

/// Deploy every file below `source` into `dest`, preserving relative
/// subpaths.
///
/// # Errors
///
/// Returns an error on the first file that cannot be copied or backed up.
pub fn deploy_tree(
    source: &Path,
    dest: &Path,
    overwrite: bool,
    log: &dyn Log,
) -> Result<DeployReport, DeployError> {
    let mut files = Vec::new();
    collect_relative(source, Path::new(""), &mut files)?;
    files.sort();
    place_all(source, dest, &files, overwrite, log)
}

/// Deploy the immediate files of `source` into each of `roots`.
///
/// Every root gets its own backup directory, and a failure on one root does
/// not stop the others.
pub fn deploy_to_roots(
    source: &Path,
    roots: &[PathBuf],
    overwrite: bool,
    exclude: &[&str],
    log: &dyn Log,
) -> Vec<(PathBuf, Result<DeployReport, DeployError>)> {
    roots
        .iter()
        .map(|root| {
            let result = deploy(source, root, overwrite, exclude, log);
            (root.clone(), result)
        })
        .collect()
}

fn collect_relative(
    root: &Path,
    relative: &Path,
    files: &mut Vec<PathBuf>,
) -> Result<(), DeployError> {
    let dir = root.join(relative);
    for entry in std::fs::read_dir(&dir).map_err(|e| DeployError::io("read", &dir, e))? {
        let entry = entry.map_err(|e| DeployError::io("read", &dir, e))?;
        let child = relative.join(entry.file_name());
        if entry.path().is_dir() {
            collect_relative(root, &child, files)?;
        } else {
            files.push(child);
        }
    }
    Ok(())
}

fn place_all(
    source: &Path,
    dest: &Path,
    files: &[PathBuf],
    overwrite: bool,
    log: &dyn Log,
) -> Result<DeployReport, DeployError> {
    std::fs::create_dir_all(dest).map_err(|e| DeployError::io("mkdir", dest, e))?;

    let mut backup = BackupDir::new(dest);
    let mut report = DeployReport::default();
    let result: Result<(), DeployError> = files.iter().try_for_each(|relative| {
        let action = place(source, dest, relative, overwrite, &mut backup)?;
        log.info(&format!("{action} {}", dest.join(relative).display()));
        report.record(action);
        Ok(())
    });
    if let Some(dir) = backup.path() {
        log.info(&format!("backup: {}", dir.display()));
    }
    report.backup = backup.into_path();
    result.map(|()| report)
}

fn place(
    source: &Path,
    dest: &Path,
    relative: &Path,
    overwrite: bool,
    backup: &mut BackupDir,
) -> Result<Action, DeployError> {
    let from = source.join(relative);
    let to = dest.join(relative);

    let action = if !to.exists() {
        Action::Copy
    } else if overwrite {
        backup.preserve(&to, relative)?;
        Action::Overwrite
    } else {
        return Ok(Action::Skip);
    };

    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DeployError::io("mkdir", parent, e))?;
    }
    std::fs::copy(&from, &to).map_err(|e| DeployError::io("copy", &to, e))?;
    Ok(action)
}
