//! PowerShell module resource.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::{self, Executor, ps_quote};

/// A PowerShell module installed for the current user from the gallery.
#[derive(Debug)]
pub struct ModuleResource<'a> {
    /// Module name as published on the PowerShell Gallery.
    pub name: String,
    host: &'static str,
    executor: &'a dyn Executor,
}

impl<'a> ModuleResource<'a> {
    #[must_use]
    pub const fn new(name: String, host: &'static str, executor: &'a dyn Executor) -> Self {
        Self {
            name,
            host,
            executor,
        }
    }
}

impl Applicable for ModuleResource<'_> {
    fn description(&self) -> String {
        format!("module {}", self.name)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let script = format!(
            "$ErrorActionPreference = 'Stop'; \
             Install-Module -Name {} -Scope CurrentUser -Force -AllowClobber -Repository PSGallery",
            ps_quote(&self.name)
        );
        exec::run_powershell_checked(self.executor, self.host, &script)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ModuleResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        // Get-Module succeeds with no output for unknown names, so test the count.
        let script = format!(
            "if (-not (Get-Module -ListAvailable -Name {})) {{ exit 1 }}",
            ps_quote(&self.name)
        );
        let result = exec::run_powershell(self.executor, self.host, &script)?;
        Ok(if result.success {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn description_names_module() {
        let executor = MockExecutor::fail();
        let module = ModuleResource::new("PSReadLine".to_string(), "pwsh", &executor);
        assert_eq!(module.description(), "module PSReadLine");
    }

    #[test]
    fn present_when_list_available_finds_it() {
        let executor = MockExecutor::ok("");
        let module = ModuleResource::new("Terminal-Icons".to_string(), "pwsh", &executor);
        assert_eq!(module.current_state().unwrap(), ResourceState::Correct);
        assert!(executor.scripts()[0].contains("Get-Module -ListAvailable -Name 'Terminal-Icons'"));
    }

    #[test]
    fn missing_when_query_fails() {
        let executor = MockExecutor::fail();
        let module = ModuleResource::new("posh-git".to_string(), "pwsh", &executor);
        assert_eq!(module.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn install_targets_current_user() {
        let executor = MockExecutor::ok("");
        let module = ModuleResource::new("posh-git".to_string(), "pwsh", &executor);
        assert_eq!(module.apply().unwrap(), ResourceChange::Applied);
        let script = &executor.scripts()[0];
        assert!(script.contains("Install-Module -Name 'posh-git'"));
        assert!(script.contains("-Scope CurrentUser"));
    }

    #[test]
    fn install_failure_is_an_error() {
        let executor = MockExecutor::fail();
        let module = ModuleResource::new("posh-git".to_string(), "pwsh", &executor);
        assert!(module.apply().is_err());
    }
}
