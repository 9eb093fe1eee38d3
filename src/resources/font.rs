//! System font files and their registration with the OS.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::fs::ensure_parent_dir;
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::{self, Executor};
use crate::platform::{Os, Platform};

/// Registry subkey listing installed fonts.
#[cfg(windows)]
const FONTS_SUBKEY: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion\Fonts";

/// Broadcast `WM_FONTCHANGE` to every top-level window, waiting at most
/// 1000 ms (`SMTO_ABORTIFHUNG`).
const FONT_CHANGE_BROADCAST: &str = r#"
Add-Type -Namespace Win32 -Name FontChange -MemberDefinition '[DllImport("user32.dll", SetLastError = true)] public static extern System.IntPtr SendMessageTimeout(System.IntPtr hWnd, uint Msg, System.UIntPtr wParam, System.IntPtr lParam, uint fuFlags, uint uTimeout, out System.UIntPtr lpdwResult);'
$result = [System.UIntPtr]::Zero
[void][Win32.FontChange]::SendMessageTimeout([System.IntPtr]0xffff, 0x001D, [System.UIntPtr]::Zero, [System.IntPtr]::Zero, 0x0002, 1000, [ref]$result)
"#;

/// The OS facility that makes newly copied font files usable.
pub trait FontRegistrar: Send + Sync + std::fmt::Debug {
    /// Directory fonts are installed into.
    fn fonts_dir(&self) -> &Path;

    /// Register a font file already copied into [`fonts_dir`](Self::fonts_dir).
    ///
    /// # Errors
    ///
    /// Returns an error if the registration facility rejects the file.
    fn register(&self, installed: &Path) -> Result<()>;

    /// Notify running applications that the font set changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification cannot be sent.
    fn broadcast(&self) -> Result<()>;
}

/// Production [`FontRegistrar`]: the font registry key and `WM_FONTCHANGE`
/// on Windows, `fc-cache` elsewhere.
#[derive(Debug)]
pub struct SystemFontRegistrar {
    os: Os,
    fonts_dir: PathBuf,
    executor: Arc<dyn Executor>,
}

impl SystemFontRegistrar {
    #[must_use]
    pub fn new(platform: &Platform, executor: Arc<dyn Executor>) -> Self {
        Self {
            os: platform.os,
            fonts_dir: platform.fonts_dir(),
            executor,
        }
    }
}

impl FontRegistrar for SystemFontRegistrar {
    fn fonts_dir(&self) -> &Path {
        &self.fonts_dir
    }

    fn register(&self, installed: &Path) -> Result<()> {
        match self.os {
            Os::Windows => register_in_registry(installed),
            // fontconfig discovers files by scanning; see broadcast().
            Os::Linux => Ok(()),
        }
    }

    fn broadcast(&self) -> Result<()> {
        match self.os {
            Os::Windows => {
                exec::run_powershell_checked(
                    &*self.executor,
                    exec::system_powershell(),
                    FONT_CHANGE_BROADCAST,
                )?;
            }
            Os::Linux => {
                let dir = self.fonts_dir.to_string_lossy();
                self.executor.run("fc-cache", &["-f", &dir])?;
            }
        }
        Ok(())
    }
}

/// Registry value name for a font file: `"<stem> (TrueType)"` or
/// `"<stem> (OpenType)"`.
#[must_use]
pub fn registry_value_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("otf") => "OpenType",
        _ => "TrueType",
    };
    format!("{stem} ({kind})")
}

#[cfg(windows)]
fn register_in_registry(installed: &Path) -> Result<()> {
    use winreg::RegKey;
    use winreg::enums::HKEY_LOCAL_MACHINE;

    let file_name = installed
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("font path has no file name: {}", installed.display()))?;
    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let (key, _) = hklm
        .create_subkey(FONTS_SUBKEY)
        .context("opening font registry key")?;
    key.set_value(registry_value_name(installed), &file_name)
        .with_context(|| format!("registering font {file_name}"))?;
    Ok(())
}

#[cfg(not(windows))]
fn register_in_registry(_installed: &Path) -> Result<()> {
    anyhow::bail!("font registry is only available on Windows")
}

/// A single font file installed into the system font directory.
#[derive(Debug)]
pub struct FontFileResource<'a> {
    source: PathBuf,
    target: PathBuf,
    registrar: &'a dyn FontRegistrar,
}

impl<'a> FontFileResource<'a> {
    /// Describe installing `source` into the registrar's font directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` has no file name.
    pub fn new(source: PathBuf, registrar: &'a dyn FontRegistrar) -> Result<Self> {
        let name = source
            .file_name()
            .with_context(|| format!("font path has no file name: {}", source.display()))?;
        let target = registrar.fonts_dir().join(name);
        Ok(Self {
            source,
            target,
            registrar,
        })
    }

    /// Path the font file is installed to.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl Applicable for FontFileResource<'_> {
    fn description(&self) -> String {
        format!("font {}", self.target.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.target)?;
        std::fs::copy(&self.source, &self.target).with_context(|| {
            format!(
                "copying {} to {}",
                self.source.display(),
                self.target.display()
            )
        })?;
        self.registrar.register(&self.target)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for FontFileResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(if self.target.is_file() {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}
