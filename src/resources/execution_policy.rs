//! PowerShell execution policy for the current user.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::{self, Executor};

/// Policies under which locally written profile scripts may run.
const ACCEPTED: [&str; 3] = ["RemoteSigned", "Unrestricted", "Bypass"];

/// Ensures the `CurrentUser` execution policy allows local scripts.
#[derive(Debug)]
pub struct ExecutionPolicyResource<'a> {
    host: &'static str,
    executor: &'a dyn Executor,
}

impl<'a> ExecutionPolicyResource<'a> {
    /// Create a resource that queries and sets the policy through `host`.
    #[must_use]
    pub const fn new(host: &'static str, executor: &'a dyn Executor) -> Self {
        Self { host, executor }
    }
}

impl Applicable for ExecutionPolicyResource<'_> {
    fn description(&self) -> String {
        "execution policy (CurrentUser) → RemoteSigned".to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        exec::run_powershell_checked(
            self.executor,
            self.host,
            "Set-ExecutionPolicy -ExecutionPolicy RemoteSigned -Scope CurrentUser -Force",
        )?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ExecutionPolicyResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let result = exec::run_powershell(
            self.executor,
            self.host,
            "Get-ExecutionPolicy -Scope CurrentUser",
        )?;
        if !result.success {
            return Ok(ResourceState::Missing);
        }
        let current = result.stdout.trim();
        if ACCEPTED.iter().any(|p| p.eq_ignore_ascii_case(current)) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: current.to_string(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn remote_signed_is_correct() {
        let executor = MockExecutor::ok("RemoteSigned\r\n");
        let resource = ExecutionPolicyResource::new("powershell", &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Correct);
    }

    #[test]
    fn bypass_is_correct() {
        let executor = MockExecutor::ok("Bypass\n");
        let resource = ExecutionPolicyResource::new("powershell", &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Correct);
    }

    #[test]
    fn undefined_is_incorrect() {
        let executor = MockExecutor::ok("Undefined\n");
        let resource = ExecutionPolicyResource::new("powershell", &executor);
        assert_eq!(
            resource.current_state().unwrap(),
            ResourceState::Incorrect {
                current: "Undefined".to_string()
            }
        );
    }

    #[test]
    fn failed_query_is_missing() {
        let executor = MockExecutor::fail();
        let resource = ExecutionPolicyResource::new("powershell", &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn apply_sets_remote_signed_for_current_user() {
        let executor = MockExecutor::ok("");
        let resource = ExecutionPolicyResource::new("powershell", &executor);
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);

        let scripts = executor.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("Set-ExecutionPolicy -ExecutionPolicy RemoteSigned"));
        assert!(scripts[0].contains("-Scope CurrentUser"));
    }

    #[test]
    fn apply_failure_is_an_error() {
        let executor = MockExecutor::fail();
        let resource = ExecutionPolicyResource::new("powershell", &executor);
        assert!(resource.apply().is_err());
    }
}
