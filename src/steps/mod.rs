//! Named provisioning steps run in a fixed order.
//!
//! Every step is idempotent and best effort: a failing step is reported and
//! recorded, and the pipeline moves on. Only a step declared
//! [`fatal`](Step::fatal) halts the run.
pub mod context;
pub mod execution_policy;
pub mod fonts;
pub mod modules;
pub mod oh_my_posh;
mod processing;
pub mod profile;
pub mod scoop;

pub use context::Context;
pub use processing::{BatchStats, StepResult, process_resource_states, process_resources};

use anyhow::Result;

use crate::error::StepError;
use crate::logging::{Log, TaskStatus};

/// A named, executable step.
pub trait Step: Send + Sync {
    /// Human-readable step name.
    fn name(&self) -> &'static str;

    /// Whether a failure of this step halts the run.
    fn fatal(&self) -> bool {
        false
    }

    /// Whether this step applies to the current platform and flags.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails; the orchestrator decides whether
    /// the failure is fatal.
    fn run(&self, ctx: &Context) -> Result<StepResult>;
}

/// The complete pipeline, in execution order.
#[must_use]
pub fn all_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(execution_policy::ConfigureExecutionPolicy),
        Box::new(scoop::InstallScoop),
        Box::new(scoop::AddScoopBuckets),
        Box::new(scoop::InstallScoopApps),
        Box::new(modules::InstallShellModules),
        Box::new(oh_my_posh::InstallOhMyPosh),
        Box::new(profile::DeployProfilePack),
        Box::new(fonts::InstallFonts),
    ]
}

/// Run every step in order, stopping only at a fatal failure.
///
/// # Errors
///
/// Returns [`StepError::Fatal`] for the first fatal step that fails.
pub fn run_pipeline(steps: &[Box<dyn Step>], ctx: &Context) -> Result<(), StepError> {
    let total = steps.len();
    for (i, step) in steps.iter().enumerate() {
        execute(step.as_ref(), ctx, i + 1, total)?;
    }
    Ok(())
}

/// Execute a step at pipeline position `index` of `total`, recording the
/// result in the logger.
///
/// # Errors
///
/// Returns [`StepError::Fatal`] if the step is fatal and fails.
pub fn execute(step: &dyn Step, ctx: &Context, index: usize, total: usize) -> Result<(), StepError> {
    if !step.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping step: {} (not applicable)", step.name()));
        ctx.log
            .record_task(step.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }
    run_step(&*ctx.log, (index, total), step.name(), step.fatal(), || {
        step.run(ctx)
    })
}

/// Report a start line with the progress percentage, run `action`, then
/// report and record its outcome.
///
/// A failure is always logged and recorded; it is returned only when
/// `fatal` is set.
///
/// # Errors
///
/// Returns [`StepError::Fatal`] if `fatal` is set and `action` fails.
pub fn run_step(
    log: &dyn Log,
    (index, total): (usize, usize),
    name: &str,
    fatal: bool,
    action: impl FnOnce() -> Result<StepResult>,
) -> Result<(), StepError> {
    log.progress(index, total, name);

    match action() {
        Ok(StepResult::Ok) => {
            log.record_task(name, TaskStatus::Ok, None);
            Ok(())
        }
        Ok(StepResult::Skipped(reason)) => {
            log.info(&format!("skipped: {reason}"));
            log.record_task(name, TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Err(e) => {
            let reason = format!("{e:#}");
            log.error(&format!("{name}: {reason}"));
            log.record_task(name, TaskStatus::Failed, Some(&reason));
            if fatal {
                Err(StepError::Fatal {
                    step: name.to_string(),
                    reason,
                })
            } else {
                Ok(())
            }
        }
    }
}

/// Run `action` and discard its error.
///
/// For notifications whose failure must never affect the run.
pub fn attempt<T, E>(action: impl FnOnce() -> Result<T, E>) -> Option<T> {
    action().ok()
}

/// Shared helpers for step unit tests.
#[cfg(test)]
pub mod test_helpers {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use crate::cli::Cli;
    use crate::config::{Config, Settings};
    use crate::exec::Executor;
    use crate::fetch::{Fetcher, Transport};
    use crate::logging::{Log, TaskEntry, TaskStatus};
    use crate::platform::{Os, Platform};
    use crate::resources::font::test_helpers::DirRegistrar;
    use crate::resources::test_helpers::MockExecutor;

    use super::Context;

    /// [`Log`] that keeps every message and step record in memory.
    #[derive(Debug, Default)]
    pub struct RecordingLog {
        lines: Mutex<Vec<String>>,
        entries: Mutex<Vec<TaskEntry>>,
    }

    impl RecordingLog {
        /// Every message logged so far, without level tags.
        #[must_use]
        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().map_or_else(|_| vec![], |l| l.clone())
        }

        /// Every step record so far.
        #[must_use]
        pub fn entries(&self) -> Vec<TaskEntry> {
            self.entries.lock().map_or_else(|_| vec![], |e| e.clone())
        }

        /// Status recorded for `name`, if any.
        #[must_use]
        pub fn status_of(&self, name: &str) -> Option<TaskStatus> {
            self.entries()
                .into_iter()
                .find(|e| e.name == name)
                .map(|e| e.status)
        }

        fn push(&self, msg: &str) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push(msg.to_string());
            }
        }
    }

    impl Log for RecordingLog {
        fn stage(&self, msg: &str) {
            self.push(msg);
        }
        fn info(&self, msg: &str) {
            self.push(msg);
        }
        fn debug(&self, msg: &str) {
            self.push(msg);
        }
        fn warn(&self, msg: &str) {
            self.push(msg);
        }
        fn error(&self, msg: &str) {
            self.push(msg);
        }
        fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
            if let Ok(mut entries) = self.entries.lock() {
                entries.push(TaskEntry {
                    name: name.to_string(),
                    status,
                    message: message.map(String::from),
                });
            }
        }
    }

    /// Configuration with every flag off and default settings.
    #[must_use]
    pub fn default_config() -> Config {
        Config::from_parts(&Cli::default(), Settings::default())
    }

    /// Build a [`Context`] from its parts; fonts go to `/nonexistent/fonts`.
    #[must_use]
    pub fn make_context(
        config: Config,
        platform: Platform,
        executor: Arc<dyn Executor>,
        transports: Vec<Box<dyn Transport>>,
        log: Arc<dyn Log>,
    ) -> Context {
        Context {
            config: Arc::new(config),
            platform: Arc::new(platform),
            log,
            executor,
            fetcher: Arc::new(Fetcher::with_transports(transports)),
            fonts: Arc::new(DirRegistrar::new(Path::new("/nonexistent/fonts"))),
        }
    }

    /// Linux context with a failing executor and no transports.
    #[must_use]
    pub fn linux_context() -> Context {
        recording_context().0
    }

    /// Linux context that also returns its [`RecordingLog`].
    #[must_use]
    pub fn recording_context() -> (Context, Arc<RecordingLog>) {
        let log = Arc::new(RecordingLog::default());
        let ctx = make_context(
            default_config(),
            Platform::new(Os::Linux, "/home/test"),
            Arc::new(MockExecutor::with_responses(vec![])),
            vec![],
            Arc::clone(&log) as Arc<dyn Log>,
        );
        (ctx, log)
    }

    /// Windows context over `config`, with the given executor.
    #[must_use]
    pub fn windows_context(config: Config, executor: Arc<dyn Executor>) -> Context {
        make_context(
            config,
            Platform::new(Os::Windows, "/home/test"),
            executor,
            vec![],
            Arc::new(RecordingLog::default()),
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_helpers::recording_context;

    /// A mock step for testing `execute()`.
    struct MockStep {
        name: &'static str,
        fatal: bool,
        should_run: bool,
        result: Result<StepResult, String>,
        runs: AtomicUsize,
    }

    impl MockStep {
        fn new(name: &'static str, result: Result<StepResult, String>) -> Self {
            Self {
                name,
                fatal: false,
                should_run: true,
                result,
                runs: AtomicUsize::new(0),
            }
        }
    }

    impl Step for MockStep {
        fn name(&self) -> &'static str {
            self.name
        }
        fn fatal(&self) -> bool {
            self.fatal
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            self.should_run
        }
        fn run(&self, _ctx: &Context) -> Result<StepResult> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    #[test]
    fn execute_records_not_applicable_step() {
        let (ctx, log) = recording_context();
        let mut step = MockStep::new("n/a", Ok(StepResult::Ok));
        step.should_run = false;

        execute(&step, &ctx, 1, 1).unwrap();
        assert_eq!(step.runs.load(Ordering::SeqCst), 0);
        assert_eq!(log.status_of("n/a"), Some(TaskStatus::NotApplicable));
    }

    #[test]
    fn execute_records_skipped_step_with_reason() {
        let (ctx, log) = recording_context();
        let step = MockStep::new("s", Ok(StepResult::Skipped("nothing to do".to_string())));

        execute(&step, &ctx, 1, 1).unwrap();
        let entries = log.entries();
        assert_eq!(entries[0].status, TaskStatus::Skipped);
        assert_eq!(entries[0].message.as_deref(), Some("nothing to do"));
    }

    #[test]
    fn non_fatal_failure_is_recorded_and_swallowed() {
        let (ctx, log) = recording_context();
        let step = MockStep::new("flaky", Err("network down".to_string()));

        execute(&step, &ctx, 2, 8).unwrap();
        assert_eq!(log.status_of("flaky"), Some(TaskStatus::Failed));
        assert!(log.lines().iter().any(|l| l == "flaky: network down"));
    }

    #[test]
    fn fatal_failure_propagates() {
        let (ctx, _log) = recording_context();
        let mut step = MockStep::new("policy", Err("access denied".to_string()));
        step.fatal = true;

        let err = execute(&step, &ctx, 1, 8).unwrap_err();
        assert_eq!(
            err.to_string(),
            "fatal step 'policy' failed: access denied"
        );
    }

    #[test]
    fn progress_line_shows_share_of_finished_steps() {
        let (ctx, log) = recording_context();
        let step = MockStep::new("Add scoop buckets", Ok(StepResult::Ok));

        execute(&step, &ctx, 3, 8).unwrap();
        assert_eq!(log.lines()[0], "[3/8  25%] Add scoop buckets");
    }

    #[test]
    fn pipeline_continues_after_non_fatal_failure() {
        let (ctx, log) = recording_context();
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(MockStep::new("one", Err("boom".to_string()))),
            Box::new(MockStep::new("two", Ok(StepResult::Ok))),
        ];

        run_pipeline(&steps, &ctx).unwrap();
        assert_eq!(log.status_of("one"), Some(TaskStatus::Failed));
        assert_eq!(log.status_of("two"), Some(TaskStatus::Ok));
    }

    #[test]
    fn pipeline_halts_at_fatal_failure() {
        let (ctx, log) = recording_context();
        let mut first = MockStep::new("first", Err("denied".to_string()));
        first.fatal = true;
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(first),
            Box::new(MockStep::new("second", Ok(StepResult::Ok))),
        ];

        assert!(run_pipeline(&steps, &ctx).is_err());
        assert_eq!(log.status_of("second"), None);
    }

    #[test]
    fn attempt_discards_errors() {
        assert_eq!(attempt(|| Err::<(), _>(anyhow::anyhow!("ignored"))), None);
        assert_eq!(attempt(|| Ok::<_, String>(7)), Some(7));
    }

    #[test]
    fn only_execution_policy_is_fatal() {
        let fatal: Vec<_> = all_steps()
            .iter()
            .filter(|s| s.fatal())
            .map(|s| s.name())
            .collect();
        assert_eq!(fatal, vec!["Configure execution policy"]);
    }
}
