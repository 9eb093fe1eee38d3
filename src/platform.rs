use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information and the well-known locations derived from it.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
    /// User's home directory (`USERPROFILE` on Windows, `HOME` elsewhere).
    pub home: PathBuf,
    /// OneDrive root, when a cloud-synced folder is detected.
    pub onedrive: Option<PathBuf>,
    /// Windows directory (`WINDIR`); only meaningful on Windows.
    pub windir: Option<PathBuf>,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHome`] if neither `USERPROFILE` nor `HOME`
    /// is set.
    pub fn detect() -> Result<Self, ConfigError> {
        let os = Self::detect_os();
        let home = if os == Os::Windows {
            std::env::var("USERPROFILE").or_else(|_| std::env::var("HOME"))
        } else {
            std::env::var("HOME")
        }
        .map_err(|_| ConfigError::NoHome)?;

        let onedrive = std::env::var("OneDrive")
            .ok()
            .map(PathBuf::from)
            .filter(|p| p.is_dir());

        Ok(Self {
            os,
            home: PathBuf::from(home),
            onedrive,
            windir: std::env::var("WINDIR").ok().map(PathBuf::from),
        })
    }

    /// Create a platform with explicit values (for tests and tooling).
    #[must_use]
    pub fn new(os: Os, home: impl Into<PathBuf>) -> Self {
        Self {
            os,
            home: home.into(),
            onedrive: None,
            windir: None,
        }
    }

    /// Set the detected OneDrive root.
    #[must_use]
    pub fn with_onedrive(mut self, onedrive: impl Into<PathBuf>) -> Self {
        self.onedrive = Some(onedrive.into());
        self
    }

    /// Whether this is Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Directories hosting PowerShell profiles, in deployment order.
    ///
    /// On Windows: the PowerShell 7 and Windows PowerShell 5.1 document
    /// roots, plus the OneDrive-mirrored PowerShell 7 root when OneDrive is
    /// detected (folder redirection moves `$PROFILE` there).  Elsewhere:
    /// `~/.config/powershell`.
    #[must_use]
    pub fn profile_roots(&self) -> Vec<PathBuf> {
        match self.os {
            Os::Windows => {
                let documents = self.home.join("Documents");
                let mut roots = vec![
                    documents.join("PowerShell"),
                    documents.join("WindowsPowerShell"),
                ];
                if let Some(onedrive) = &self.onedrive {
                    roots.push(onedrive.join("Documents").join("PowerShell"));
                }
                roots
            }
            Os::Linux => vec![self.home.join(".config").join("powershell")],
        }
    }

    /// System-wide font directory.
    #[must_use]
    pub fn fonts_dir(&self) -> PathBuf {
        match self.os {
            Os::Windows => self
                .windir
                .as_deref()
                .unwrap_or_else(|| Path::new(r"C:\Windows"))
                .join("Fonts"),
            Os::Linux => PathBuf::from("/usr/local/share/fonts"),
        }
    }

    /// Default oh-my-posh theme directory.
    #[must_use]
    pub fn default_theme_dir(&self) -> PathBuf {
        self.home.join(".poshthemes")
    }

    fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            // Linux and other Unix-like systems share the same layout
            Os::Linux
        }
    }
}
