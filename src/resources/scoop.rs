//! Scoop package manager, its buckets and its apps.
//!
//! Scoop is a PowerShell program, so every query and install goes through a
//! PowerShell host. Each script first reloads `PATH` from the registry so a
//! scoop installed earlier in the same run is visible.
use std::collections::BTreeSet;

use anyhow::Result;
use serde_json::Value;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::{self, Executor, ps_quote};

const REFRESH_PATH: &str = "$env:Path = [Environment]::GetEnvironmentVariable('Path', 'Machine') + ';' + [Environment]::GetEnvironmentVariable('Path', 'User')";

/// Exits 127 when scoop is not on `PATH`. A missing command would otherwise
/// leave `$LASTEXITCODE` unset and the script would exit 0.
const REQUIRE_SCOOP: &str =
    "if (-not (Get-Command scoop -ErrorAction SilentlyContinue)) { exit 127 }";

/// Build a script that runs a scoop command with a fresh `PATH` and exits
/// with scoop's own exit code, or non-zero if scoop could not run at all.
fn scoop_script(command: &str) -> String {
    format!(
        "{REFRESH_PATH}; {REQUIRE_SCOOP}; scoop {command}; \
         if ($?) {{ exit [int]$LASTEXITCODE }} else {{ exit 1 }}"
    )
}

/// The scoop package manager itself.
#[derive(Debug)]
pub struct ScoopResource<'a> {
    host: &'static str,
    executor: &'a dyn Executor,
}

impl<'a> ScoopResource<'a> {
    #[must_use]
    pub const fn new(host: &'static str, executor: &'a dyn Executor) -> Self {
        Self { host, executor }
    }
}

impl Applicable for ScoopResource<'_> {
    fn description(&self) -> String {
        "scoop".to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        // The installer refuses to run elevated unless told to.
        let script = format!(
            "$ErrorActionPreference = 'Stop'; \
             [Net.ServicePointManager]::SecurityProtocol = [Net.SecurityProtocolType]::Tls12; \
             iex \"& {{$(irm get.scoop.sh)}} -RunAsAdmin\"; {REFRESH_PATH}"
        );
        exec::run_powershell_checked(self.executor, self.host, &script)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ScoopResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let script = format!("{REFRESH_PATH}; Get-Command scoop -ErrorAction Stop | Out-Null");
        let result = exec::run_powershell(self.executor, self.host, &script)?;
        Ok(if result.success {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}

/// A scoop bucket (a named manifest repository).
///
/// Presence is checked against a single bulk listing (see
/// [`get_listed_buckets`]), so this type implements only [`Applicable`].
#[derive(Debug)]
pub struct BucketResource<'a> {
    /// Bucket name as given to `scoop bucket add`.
    pub name: String,
    host: &'static str,
    executor: &'a dyn Executor,
}

impl<'a> BucketResource<'a> {
    #[must_use]
    pub const fn new(name: String, host: &'static str, executor: &'a dyn Executor) -> Self {
        Self {
            name,
            host,
            executor,
        }
    }

    /// Determine the resource state from a pre-fetched set of bucket names.
    ///
    /// Bucket names are case-insensitive in scoop.
    #[must_use]
    pub fn state_from_listed(&self, listed: &BTreeSet<String>) -> ResourceState {
        if listed.contains(&self.name.to_lowercase()) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }
}

impl Applicable for BucketResource<'_> {
    fn description(&self) -> String {
        format!("bucket {}", self.name)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let script = scoop_script(&format!("bucket add {}", ps_quote(&self.name)));
        exec::run_powershell_checked(self.executor, self.host, &script)?;
        Ok(ResourceChange::Applied)
    }
}

/// Query the set of registered bucket names (lower-cased).
///
/// A failed or unparsable query yields an empty set, so every bucket is
/// treated as absent and the add attempt reports the underlying error.
///
/// # Errors
///
/// Returns an error only if the PowerShell host cannot be spawned.
pub fn get_listed_buckets(host: &str, executor: &dyn Executor) -> Result<BTreeSet<String>> {
    let script = format!(
        "{REFRESH_PATH}; {REQUIRE_SCOOP}; scoop bucket list | ConvertTo-Json -Depth 2 -Compress"
    );
    let result = exec::run_powershell(executor, host, &script)?;
    if !result.success {
        return Ok(BTreeSet::new());
    }
    let trimmed = result.stdout.trim();
    if trimmed.is_empty() {
        return Ok(BTreeSet::new());
    }
    Ok(serde_json::from_str::<Value>(trimmed)
        .map(|v| normalize_bucket_list(&v))
        .unwrap_or_default())
}

/// Normalize a `scoop bucket list` JSON rendering into a set of names.
///
/// Scoop emits an array of records, a bare record when only one bucket is
/// registered, or plain strings on older versions. Each element is matched
/// in priority order: a string is the name itself; an object contributes its
/// `Name` (or `name`) field; anything else is coerced to its string form.
#[must_use]
pub fn normalize_bucket_list(value: &Value) -> BTreeSet<String> {
    let items: &[Value] = match value {
        Value::Array(items) => items,
        Value::Null => &[],
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .filter_map(bucket_name)
        .map(|name| name.to_lowercase())
        .collect()
}

fn bucket_name(item: &Value) -> Option<String> {
    let name = match item {
        Value::String(name) => Some(name.clone()),
        Value::Object(record) => record
            .get("Name")
            .or_else(|| record.get("name"))
            .and_then(Value::as_str)
            .map(ToString::to_string),
        Value::Null => None,
        other => Some(other.to_string()),
    };
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// A scoop app.
#[derive(Debug)]
pub struct AppResource<'a> {
    /// App name as given to `scoop install`.
    pub name: String,
    host: &'static str,
    executor: &'a dyn Executor,
}

impl<'a> AppResource<'a> {
    #[must_use]
    pub const fn new(name: String, host: &'static str, executor: &'a dyn Executor) -> Self {
        Self {
            name,
            host,
            executor,
        }
    }
}

impl Applicable for AppResource<'_> {
    fn description(&self) -> String {
        format!("app {}", self.name)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let script = scoop_script(&format!("install {}", ps_quote(&self.name)));
        exec::run_powershell_checked(self.executor, self.host, &script)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for AppResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let script = scoop_script(&format!("which {}", ps_quote(&self.name)));
        let result = exec::run_powershell(self.executor, self.host, &script)?;
        Ok(if result.success {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}
