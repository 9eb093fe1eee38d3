//! Lazily created, timestamped backup directories.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::DeployError;

/// Timestamp format of backup directory names (sortable, second resolution).
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `<dest>Backup_<timestamp>`, a sibling of `dest`.
#[must_use]
pub fn backup_name(dest: &Path, timestamp: &str) -> PathBuf {
    // Rebuild from components to drop any trailing separator.
    let normalized: PathBuf = dest.components().collect();
    let mut name = OsString::from(normalized.as_os_str());
    name.push("Backup_");
    name.push(timestamp);
    PathBuf::from(name)
}

/// Backup directory for one deployment call.
///
/// Nothing touches the filesystem until the first [`preserve`](Self::preserve);
/// a deployment that overwrites nothing leaves no backup behind. When the
/// name is already taken (two runs within the same second) a `_1`, `_2`, ...
/// suffix is appended.
#[derive(Debug)]
pub struct BackupDir {
    dest: PathBuf,
    timestamp: String,
    created: Option<PathBuf>,
}

impl BackupDir {
    /// Backup for `dest` stamped with the current local time.
    #[must_use]
    pub fn new(dest: &Path) -> Self {
        Self::with_timestamp(dest, &chrono::Local::now().format(TIMESTAMP_FORMAT).to_string())
    }

    /// Backup for `dest` with an explicit timestamp.
    #[must_use]
    pub fn with_timestamp(dest: &Path, timestamp: &str) -> Self {
        Self {
            dest: dest.to_path_buf(),
            timestamp: timestamp.to_string(),
            created: None,
        }
    }

    /// The backup directory, if one has been created.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.created.as_deref()
    }

    /// Consume the handle, returning the created directory, if any.
    #[must_use]
    pub fn into_path(self) -> Option<PathBuf> {
        self.created
    }

    /// Copy `existing` into the backup directory at `relative`, creating the
    /// directory on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the copy fails.
    pub fn preserve(&mut self, existing: &Path, relative: &Path) -> Result<PathBuf, DeployError> {
        let saved = self.ensure()?.join(relative);
        if let Some(parent) = saved.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DeployError::io("mkdir", parent, e))?;
        }
        std::fs::copy(existing, &saved).map_err(|e| DeployError::io("back up", existing, e))?;
        Ok(saved)
    }

    fn ensure(&mut self) -> Result<PathBuf, DeployError> {
        if let Some(dir) = &self.created {
            return Ok(dir.clone());
        }
        let base = backup_name(&self.dest, &self.timestamp);
        let mut candidate = base.clone();
        let mut counter = 0u32;
        while candidate.exists() {
            counter += 1;
            let mut name = base.clone().into_os_string();
            name.push(format!("_{counter}"));
            candidate = PathBuf::from(name);
        }
        std::fs::create_dir_all(&candidate).map_err(|e| DeployError::io("mkdir", &candidate, e))?;
        self.created = Some(candidate.clone());
        Ok(candidate)
    }
}
