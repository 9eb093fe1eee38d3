use anyhow::Result;

use super::{Context, Step, StepResult};
use crate::resources::package::WingetPackage;
use crate::resources::{self, Applicable as _, ResourceChange};

/// Install the oh-my-posh prompt engine through winget.
#[derive(Debug)]
pub struct InstallOhMyPosh;

impl Step for InstallOhMyPosh {
    fn name(&self) -> &'static str {
        "Install oh-my-posh"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_windows() && !ctx.config.skip_oh_my_posh
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let package = WingetPackage::new(
            ctx.config.settings.oh_my_posh_id.clone(),
            "oh-my-posh".to_string(),
            &*ctx.executor,
        );
        match resources::ensure(&package)? {
            ResourceChange::Applied => {
                ctx.log.info(&format!("installed {}", package.description()));
                Ok(StepResult::Ok)
            }
            ResourceChange::AlreadyCorrect => {
                ctx.log.debug("oh-my-posh already installed");
                Ok(StepResult::Ok)
            }
            ResourceChange::Skipped { reason } => Ok(StepResult::Skipped(reason)),
        }
    }
}
