//! Package installation through winget.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::{Executor, failure_detail};

/// A winget package that provides a command-line program.
#[derive(Debug)]
pub struct WingetPackage<'a> {
    /// winget package identifier (e.g. `JanDeDobbeleer.OhMyPosh`).
    pub id: String,
    /// Program the package puts on `PATH`; its presence counts as installed.
    pub command: String,
    executor: &'a dyn Executor,
}

impl<'a> WingetPackage<'a> {
    #[must_use]
    pub const fn new(id: String, command: String, executor: &'a dyn Executor) -> Self {
        Self {
            id,
            command,
            executor,
        }
    }
}

impl Applicable for WingetPackage<'_> {
    fn description(&self) -> String {
        format!("{} (winget)", self.id)
    }

    fn apply(&self) -> Result<ResourceChange> {
        if !self.executor.which("winget") {
            return Ok(ResourceChange::Skipped {
                reason: "winget is not available".to_string(),
            });
        }
        let result = self.executor.run_unchecked(
            "winget",
            &[
                "install",
                "--id",
                &self.id,
                "--exact",
                "--source",
                "winget",
                "--accept-source-agreements",
                "--accept-package-agreements",
                "--disable-interactivity",
            ],
        )?;
        if !result.success {
            anyhow::bail!("winget install failed: {}", failure_detail(&result));
        }
        Ok(ResourceChange::Applied)
    }
}

impl Resource for WingetPackage<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if self.executor.which(&self.command) {
            return Ok(ResourceState::Correct);
        }
        let result = self.executor.run_unchecked(
            "winget",
            &[
                "list",
                "--id",
                &self.id,
                "--exact",
                "--accept-source-agreements",
            ],
        );
        // winget prints a table; an exact-id hit means the package is installed.
        Ok(match result {
            Ok(r) if r.success && r.stdout.contains(&self.id) => ResourceState::Correct,
            _ => ResourceState::Missing,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    fn package(executor: &MockExecutor) -> WingetPackage<'_> {
        WingetPackage::new(
            "JanDeDobbeleer.OhMyPosh".to_string(),
            "oh-my-posh".to_string(),
            executor,
        )
    }

    #[test]
    fn description_includes_manager() {
        let executor = MockExecutor::fail();
        assert_eq!(
            package(&executor).description(),
            "JanDeDobbeleer.OhMyPosh (winget)"
        );
    }

    #[test]
    fn present_when_command_on_path() {
        let executor = MockExecutor::fail().with_which(true);
        assert_eq!(
            package(&executor).current_state().unwrap(),
            ResourceState::Correct
        );
        assert_eq!(executor.call_count(), 0);
    }

    #[test]
    fn present_when_winget_lists_exact_id() {
        let executor = MockExecutor::ok(
            "Name        Id                       Version\n\
             Oh My Posh  JanDeDobbeleer.OhMyPosh  19.0.0\n",
        );
        assert_eq!(
            package(&executor).current_state().unwrap(),
            ResourceState::Correct
        );
        let calls = executor.calls();
        assert_eq!(calls[0].0, "winget");
        assert!(calls[0].1.contains(&"--exact".to_string()));
    }

    #[test]
    fn missing_when_winget_has_no_match() {
        let executor = MockExecutor::with_responses(vec![(
            false,
            "No installed package found matching input criteria.".to_string(),
        )]);
        assert_eq!(
            package(&executor).current_state().unwrap(),
            ResourceState::Missing
        );
    }

    #[test]
    fn apply_skips_without_winget() {
        let executor = MockExecutor::fail();
        assert!(matches!(
            package(&executor).apply().unwrap(),
            ResourceChange::Skipped { .. }
        ));
    }

    #[test]
    fn apply_failure_is_an_error() {
        let executor = MockExecutor::fail().with_which(true);
        let err = package(&executor).apply().unwrap_err();
        assert!(err.to_string().contains("winget install failed"));
    }

    #[test]
    fn apply_success() {
        let executor = MockExecutor::ok("Successfully installed").with_which(true);
        assert_eq!(package(&executor).apply().unwrap(), ResourceChange::Applied);
    }
}
