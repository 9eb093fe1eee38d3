//! Administrator privilege check and elevated relaunch.
//!
//! The gate runs once, before any step. When the process is not elevated the
//! user is asked whether to relaunch; an accepted relaunch hands the whole
//! run to the new process and this one exits successfully.
use std::path::{Path, PathBuf};

use crate::error::ElevationError;
use crate::exec::{self, Executor, ps_quote};
use crate::platform::{Os, Platform};

/// Outcome of the elevation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Already privileged; continue in this process.
    Elevated,
    /// An elevated copy was started; this process should exit.
    Relaunched,
}

/// A yes/no question put to the user.
pub trait Confirm {
    /// Ask `prompt`; `Ok(true)` means yes.
    ///
    /// # Errors
    ///
    /// Returns an error if the question cannot be asked.
    fn confirm(&self, prompt: &str) -> Result<bool, ElevationError>;
}

/// Interactive terminal prompt, defaulting to "no".
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, ElevationError> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| ElevationError::Prompt(e.to_string()))
    }
}

/// Whether the current process holds administrator privileges.
///
/// Windows: `net session` only succeeds for administrators. Elsewhere: the
/// effective uid is 0. A failed check counts as not elevated.
#[must_use]
pub fn is_elevated(executor: &dyn Executor, platform: &Platform) -> bool {
    match platform.os {
        Os::Windows => executor
            .run_unchecked("net", &["session"])
            .is_ok_and(|r| r.success),
        Os::Linux => executor
            .run_unchecked("id", &["-u"])
            .is_ok_and(|r| r.success && r.stdout.trim() == "0"),
    }
}

/// Make sure the run continues with administrator privileges.
///
/// `args` are the original command-line arguments (without the program
/// name); they are forwarded verbatim to the elevated process.
///
/// # Errors
///
/// Returns [`ElevationError::Declined`] if the user refuses,
/// [`ElevationError::Prompt`] if the question cannot be asked, or
/// [`ElevationError::Relaunch`] if the elevated process cannot be started.
pub fn ensure_elevated(
    executor: &dyn Executor,
    platform: &Platform,
    confirm: &dyn Confirm,
    args: &[String],
) -> Result<Gate, ElevationError> {
    if is_elevated(executor, platform) {
        return Ok(Gate::Elevated);
    }
    if !confirm.confirm("Administrator privileges are required. Relaunch elevated?")? {
        return Err(ElevationError::Declined);
    }
    let exe = current_exe()?;
    relaunch(executor, platform, &exe, args)?;
    Ok(Gate::Relaunched)
}

fn current_exe() -> Result<PathBuf, ElevationError> {
    let exe = std::env::current_exe().map_err(|e| ElevationError::Relaunch(e.to_string()))?;
    dunce::canonicalize(&exe).map_err(|e| ElevationError::Relaunch(format!("{}: {e}", exe.display())))
}

fn relaunch(
    executor: &dyn Executor,
    platform: &Platform,
    exe: &Path,
    args: &[String],
) -> Result<(), ElevationError> {
    let relaunch_error = |e: anyhow::Error| ElevationError::Relaunch(format!("{e:#}"));
    match platform.os {
        Os::Windows => {
            let script = runas_script(exe, args);
            exec::run_powershell_checked(executor, exec::system_powershell(), &script)
                .map(drop)
                .map_err(relaunch_error)
        }
        Os::Linux => {
            let exe = exe.to_string_lossy();
            let mut sudo_args = vec![&*exe];
            sudo_args.extend(args.iter().map(String::as_str));
            executor
                .run_interactive("sudo", &sudo_args)
                .map_err(relaunch_error)
        }
    }
}

/// `Start-Process -Verb RunAs` invocation for `exe` and `args`.
///
/// `Start-Process` joins `-ArgumentList` with spaces, so arguments that
/// contain whitespace or quotes are wrapped for the Windows command line.
#[must_use]
pub fn runas_script(exe: &Path, args: &[String]) -> String {
    let mut script = format!(
        "Start-Process -Verb RunAs -FilePath {}",
        ps_quote(&exe.to_string_lossy())
    );
    if !args.is_empty() {
        let list: Vec<String> = args
            .iter()
            .map(|a| ps_quote(&quote_windows_arg(a)))
            .collect();
        script.push_str(" -ArgumentList ");
        script.push_str(&list.join(","));
    }
    script
}

/// Quote one argument so `CommandLineToArgvW` reads it back unchanged.
///
/// Backslashes are literal except in runs that precede a quote; those runs
/// are doubled, including the run before the closing quote.
fn quote_windows_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return arg.to_string();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.push_str(&"\\".repeat(backslashes * 2 + 1));
                quoted.push('"');
                backslashes = 0;
            }
            _ => {
                quoted.push_str(&"\\".repeat(backslashes));
                quoted.push(c);
                backslashes = 0;
            }
        }
    }
    quoted.push_str(&"\\".repeat(backslashes * 2));
    quoted.push('"');
    quoted
}
