use anyhow::{Context as _, Result};

use super::{Context, Step, StepResult};
use crate::exec;
use crate::resources::execution_policy::ExecutionPolicyResource;
use crate::resources::{Applicable as _, Resource as _};

/// Allow local profile scripts to run for the current user.
///
/// Windows PowerShell and PowerShell 7 keep separate policies, so both are
/// configured when `pwsh` is installed.
#[derive(Debug)]
pub struct ConfigureExecutionPolicy;

impl Step for ConfigureExecutionPolicy {
    fn name(&self) -> &'static str {
        "Configure execution policy"
    }

    fn fatal(&self) -> bool {
        true
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_windows()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let mut hosts = vec![exec::system_powershell()];
        if ctx.executor.which("pwsh") {
            hosts.push("pwsh");
        }

        for host in hosts {
            let resource = ExecutionPolicyResource::new(host, &*ctx.executor);
            if resource.needs_change()? {
                resource
                    .apply()
                    .with_context(|| format!("setting execution policy with {host}"))?;
                ctx.log.info(&format!("{host}: {}", resource.description()));
            } else {
                ctx.log.debug(&format!("{host}: execution policy already allows scripts"));
            }
        }
        Ok(StepResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::Executor;
    use crate::resources::test_helpers::MockExecutor;
    use crate::steps::test_helpers::{default_config, linux_context, windows_context};
    use std::sync::Arc;

    #[test]
    fn windows_only() {
        assert!(!ConfigureExecutionPolicy.should_run(&linux_context()));
        let ctx = windows_context(default_config(), Arc::new(MockExecutor::fail()));
        assert!(ConfigureExecutionPolicy.should_run(&ctx));
    }

    #[test]
    fn already_allowed_makes_no_change() {
        let executor = Arc::new(MockExecutor::ok("RemoteSigned"));
        let ctx = windows_context(default_config(), Arc::clone(&executor) as Arc<dyn Executor>);
        assert_eq!(ConfigureExecutionPolicy.run(&ctx).unwrap(), StepResult::Ok);
        assert_eq!(executor.call_count(), 1);
    }

    #[test]
    fn restricted_policy_is_changed() {
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, "Restricted".to_string()),
            (true, String::new()),
        ]));
        let ctx = windows_context(default_config(), Arc::clone(&executor) as Arc<dyn Executor>);
        ConfigureExecutionPolicy.run(&ctx).unwrap();
        assert!(executor.scripts()[1].starts_with("Set-ExecutionPolicy"));
    }

    #[test]
    fn failure_to_set_is_an_error() {
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, "Restricted".to_string()),
            (false, String::new()),
        ]));
        let ctx = windows_context(default_config(), executor);
        let err = ConfigureExecutionPolicy.run(&ctx).unwrap_err();
        assert!(format!("{err:#}").contains("setting execution policy"));
    }
}
