//! Idempotent resource primitives (check + apply pattern).
pub mod execution_policy;
pub mod font;
pub mod fs;
pub mod module;
pub mod package;
pub mod scoop;

use anyhow::Result;

/// Minimal interface for resources that can be described and applied.
///
/// Resources whose state is determined via a single external bulk query (e.g.
/// scoop buckets) implement only this trait.  Resources that can determine
/// their own state independently implement the richer [`Resource`]
/// super-trait.
pub trait Applicable {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Apply the resource change.
    ///
    /// # Errors
    ///
    /// Returns an error if the installing tool cannot be run or reports
    /// failure.
    fn apply(&self) -> Result<ResourceChange>;
}

/// State of a resource (package, module, font file, policy, ...).
///
/// # Examples
///
/// ```
/// use profile_bootstrap::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let wrong = ResourceState::Incorrect { current: "Restricted".into() };
///
/// assert_ne!(missing, correct);
/// assert_ne!(wrong, correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource is not present, or its presence query failed.
    Missing,
    /// Resource is present and matches the desired state.
    Correct,
    /// Resource is present but does not match the desired state.
    Incorrect {
        /// The current value of the resource.
        current: String,
    },
}

/// Result of applying a resource change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated.
    Applied,
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
    /// Resource was skipped (e.g. the installing tool is not available).
    Skipped {
        /// Reason why the resource was skipped.
        reason: String,
    },
}

/// Unified interface for resources that can be checked and applied.
///
/// # Examples
///
/// ```ignore
/// // All resources follow the same check-then-apply pattern:
/// if resource.needs_change()? {
///     resource.apply()?;
/// }
/// ```
pub trait Resource: Applicable {
    /// Check the current state of the resource.
    ///
    /// A failing presence query is reported as [`ResourceState::Missing`]
    /// rather than an error, so the install attempt surfaces the real cause.
    ///
    /// # Errors
    ///
    /// Returns an error only if the query cannot be issued at all.
    fn current_state(&self) -> Result<ResourceState>;

    /// Determine if the resource needs to be changed.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}

/// Bring a single resource to its desired state.
///
/// # Errors
///
/// Returns an error if the state query cannot be issued or `apply` fails.
pub fn ensure(resource: &dyn Resource) -> Result<ResourceChange> {
    if resource.needs_change()? {
        resource.apply()
    } else {
        Ok(ResourceChange::AlreadyCorrect)
    }
}
