use anyhow::Result;

use super::{Context, Step, StepResult, process_resources};
use crate::resources::module::ModuleResource;

/// Install PowerShell modules for the current user.
#[derive(Debug)]
pub struct InstallShellModules;

impl Step for InstallShellModules {
    fn name(&self) -> &'static str {
        "Install shell modules"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_windows() || ctx.executor.which("pwsh")
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let modules = &ctx.config.settings.modules;
        if modules.is_empty() {
            return Ok(StepResult::Skipped("no modules configured".to_string()));
        }

        let host = ctx.powershell();
        ctx.log.debug(&format!("using {host}"));
        let resources = modules
            .iter()
            .map(|name| ModuleResource::new(name.clone(), host, &*ctx.executor));
        process_resources(ctx, resources, "install")
    }
}
