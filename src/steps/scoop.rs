use anyhow::Result;

use super::{Context, Step, StepResult, process_resource_states, process_resources};
use crate::resources::scoop::{self, AppResource, BucketResource, ScoopResource};
use crate::resources::{self, ResourceChange};

/// Install the scoop package manager.
#[derive(Debug)]
pub struct InstallScoop;

impl Step for InstallScoop {
    fn name(&self) -> &'static str {
        "Install scoop"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_windows()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let resource = ScoopResource::new(ctx.powershell(), &*ctx.executor);
        match resources::ensure(&resource)? {
            ResourceChange::Applied => ctx.log.info("installed scoop"),
            _ => ctx.log.debug("scoop already installed"),
        }
        Ok(StepResult::Ok)
    }
}

/// Register the configured scoop buckets.
#[derive(Debug)]
pub struct AddScoopBuckets;

impl Step for AddScoopBuckets {
    fn name(&self) -> &'static str {
        "Add scoop buckets"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_windows() && !ctx.config.skip_scoop_apps
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let buckets = &ctx.config.settings.buckets;
        if buckets.is_empty() {
            return Ok(StepResult::Skipped("no buckets configured".to_string()));
        }

        let host = ctx.powershell();
        let listed = scoop::get_listed_buckets(host, &*ctx.executor)?;
        ctx.log.debug(&format!("{} bucket(s) registered", listed.len()));

        let resource_states = buckets.iter().map(|name| {
            let resource = BucketResource::new(name.clone(), host, &*ctx.executor);
            let state = resource.state_from_listed(&listed);
            (resource, state)
        });
        process_resource_states(ctx, resource_states, "add")
    }
}

/// Install the configured scoop apps.
#[derive(Debug)]
pub struct InstallScoopApps;

impl Step for InstallScoopApps {
    fn name(&self) -> &'static str {
        "Install scoop apps"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_windows() && !ctx.config.skip_scoop_apps
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let apps = &ctx.config.settings.apps;
        if apps.is_empty() {
            return Ok(StepResult::Skipped("no apps configured".to_string()));
        }

        let host = ctx.powershell();
        let resources = apps
            .iter()
            .map(|name| AppResource::new(name.clone(), host, &*ctx.executor));
        process_resources(ctx, resources, "install")
    }
}
