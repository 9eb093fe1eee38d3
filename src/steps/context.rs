use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::exec::{self, Executor};
use crate::fetch::Fetcher;
use crate::logging::Log;
use crate::platform::Platform;
use crate::resources::font::FontRegistrar;

/// Shared context for step execution.
///
/// Built once after the elevation gate and never mutated.
pub struct Context {
    /// Run configuration (flags plus settings file).
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output and step recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Download transport chain.
    pub fetcher: Arc<Fetcher>,
    /// OS font registration facility.
    pub fonts: Arc<dyn FontRegistrar>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .field("fetcher", &self.fetcher)
            .field("fonts", &self.fonts)
            .finish()
    }
}

impl Context {
    /// PowerShell host used for module installs and scoop: `pwsh` when
    /// present, else the system host.
    #[must_use]
    pub fn powershell(&self) -> &'static str {
        exec::preferred_powershell(&*self.executor)
    }

    /// Destination for theme files.
    #[must_use]
    pub fn theme_dir(&self) -> PathBuf {
        self.config.theme_dir(&self.platform)
    }
}
