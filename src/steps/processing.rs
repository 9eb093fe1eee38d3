use anyhow::Result;

use super::context::Context;
use crate::resources::{Applicable, Resource, ResourceChange, ResourceState};

/// Result of a single step execution.
///
/// # Examples
///
/// ```
/// use profile_bootstrap::steps::StepResult;
///
/// let ok = StepResult::Ok;
/// let skipped = StepResult::Skipped("nothing to install".into());
///
/// assert!(matches!(ok, StepResult::Ok));
/// assert!(matches!(skipped, StepResult::Skipped(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// Step completed successfully.
    Ok,
    /// Step ran but had nothing to do.
    Skipped(String),
}

/// Counters for batch steps that process many items.
///
/// # Examples
///
/// ```
/// use profile_bootstrap::steps::BatchStats;
///
/// let mut stats = BatchStats::new();
/// stats.changed = 2;
/// stats.already_ok = 3;
/// assert_eq!(stats.summary(), "2 changed, 3 already ok");
///
/// stats.failed.push("fzf".into());
/// assert_eq!(stats.summary(), "2 changed, 3 already ok, 1 failed");
/// ```
#[derive(Debug, Default)]
pub struct BatchStats {
    /// Number of items installed or changed.
    pub changed: u32,
    /// Number of items already present.
    pub already_ok: u32,
    /// Number of items the installer declined to handle.
    pub skipped: u32,
    /// Descriptions of items that failed.
    pub failed: Vec<String>,
}

impl BatchStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 failed").
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} changed", self.changed),
            format!("{} already ok", self.already_ok),
        ];
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if !self.failed.is_empty() {
            parts.push(format!("{} failed", self.failed.len()));
        }
        parts.join(", ")
    }

    /// Log the summary, then fail with the list of failed items if any.
    ///
    /// # Errors
    ///
    /// Returns an error naming every failed item when at least one failed.
    pub fn finish(self, ctx: &Context) -> Result<StepResult> {
        ctx.log.info(&self.summary());
        if self.failed.is_empty() {
            Ok(StepResult::Ok)
        } else {
            anyhow::bail!(
                "failed: {}; re-run the bootstrap to retry",
                self.failed.join(", ")
            )
        }
    }
}

/// Check each resource and apply it when missing or incorrect.
///
/// Per-item failures are logged and collected; the loop always runs to the
/// end and the aggregate is reported by [`BatchStats::finish`].
///
/// # Errors
///
/// Returns an error listing the resources that could not be checked or
/// applied.
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    verb: &str,
) -> Result<StepResult> {
    let mut stats = BatchStats::new();
    for resource in resources {
        match resource.current_state() {
            Ok(current) => process_single(ctx, &resource, &current, verb, &mut stats),
            Err(e) => {
                ctx.log
                    .warn(&format!("cannot check {}: {e:#}", resource.description()));
                stats.failed.push(resource.description());
            }
        }
    }
    stats.finish(ctx)
}

/// Like [`process_resources`], with states computed up front by a single
/// bulk query.
///
/// # Errors
///
/// Returns an error listing the resources that could not be applied.
pub fn process_resource_states<R: Applicable>(
    ctx: &Context,
    resource_states: impl IntoIterator<Item = (R, ResourceState)>,
    verb: &str,
) -> Result<StepResult> {
    let mut stats = BatchStats::new();
    for (resource, current) in resource_states {
        process_single(ctx, &resource, &current, verb, &mut stats);
    }
    stats.finish(ctx)
}

fn process_single<R: Applicable + ?Sized>(
    ctx: &Context,
    resource: &R,
    current: &ResourceState,
    verb: &str,
    stats: &mut BatchStats,
) {
    let desc = resource.description();
    if *current == ResourceState::Correct {
        ctx.log.debug(&format!("ok: {desc}"));
        stats.already_ok += 1;
        return;
    }
    if let ResourceState::Incorrect { current } = current {
        ctx.log.debug(&format!("{desc} is {current}"));
    }
    match resource.apply() {
        Ok(ResourceChange::Applied) => {
            ctx.log.info(&format!("{verb} {desc}"));
            stats.changed += 1;
        }
        Ok(ResourceChange::AlreadyCorrect) => stats.already_ok += 1,
        Ok(ResourceChange::Skipped { reason }) => {
            ctx.log.warn(&format!("skipped {desc}: {reason}"));
            stats.skipped += 1;
        }
        Err(e) => {
            ctx.log.warn(&format!("failed to {verb} {desc}: {e:#}"));
            stats.failed.push(desc);
        }
    }
}
