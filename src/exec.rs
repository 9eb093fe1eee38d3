//! External command execution behind an injectable [`Executor`] seam.
use anyhow::{Context, Result, bail};
use base64::Engine as _;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process execution so resources and steps can be tested
/// without spawning real package managers.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, allowing failure (returns the result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the program cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with inherited stdio so the user sees its output and can
    /// answer its prompts. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.run_unchecked(program, args)?;
        if !result.success {
            bail!(
                "{program} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                failure_detail(&result)
            );
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;
        if !status.success() {
            bail!("{program} failed (exit {})", status.code().unwrap_or(-1));
        }
        Ok(())
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Pick the most useful diagnostic text from a failed command.
///
/// PowerShell and winget write most of their errors to stdout, so fall back
/// to it when stderr is empty.
#[must_use]
pub fn failure_detail(result: &ExecResult) -> String {
    let stderr = result.stderr.trim();
    if stderr.is_empty() {
        result.stdout.trim().to_string()
    } else {
        stderr.to_string()
    }
}

/// Name of the PowerShell host that is always present on the platform.
#[must_use]
pub const fn system_powershell() -> &'static str {
    if cfg!(windows) { "powershell" } else { "pwsh" }
}

/// Prefer PowerShell 7 (`pwsh`) when installed, else the system host.
#[must_use]
pub fn preferred_powershell(executor: &dyn Executor) -> &'static str {
    if executor.which("pwsh") {
        "pwsh"
    } else {
        system_powershell()
    }
}

/// Encode a script for `-EncodedCommand` (base64 over UTF-16LE).
///
/// Sidesteps every layer of quoting between Rust, the Windows command line
/// and the PowerShell parser.
#[must_use]
pub fn encode_powershell(script: &str) -> String {
    let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Quote a value as a single-quoted PowerShell string literal.
#[must_use]
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Run a PowerShell script with `host`, allowing failure.
///
/// # Errors
///
/// Returns an error only if the host cannot be spawned.
pub fn run_powershell(executor: &dyn Executor, host: &str, script: &str) -> Result<ExecResult> {
    let encoded = encode_powershell(script);
    executor.run_unchecked(
        host,
        &[
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-EncodedCommand",
            &encoded,
        ],
    )
}

/// Run a PowerShell script with `host`, failing on a non-zero exit.
///
/// # Errors
///
/// Returns an error if the host cannot be spawned or the script fails.
pub fn run_powershell_checked(
    executor: &dyn Executor,
    host: &str,
    script: &str,
) -> Result<ExecResult> {
    let result = run_powershell(executor, host, script)?;
    if !result.success {
        bail!(
            "{host} script failed (exit {}): {}",
            result.code.unwrap_or(-1),
            failure_detail(&result)
        );
    }
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: run a simple echo command cross-platform.
    fn echo_result(msg: &str) -> Result<ExecResult> {
        #[cfg(windows)]
        {
            SystemExecutor.run("cmd", &["/C", "echo", msg])
        }
        #[cfg(not(windows))]
        {
            SystemExecutor.run("echo", &[msg])
        }
    }

    #[test]
    fn run_echo() {
        let result = echo_result("hello").unwrap();
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn run_failure() {
        #[cfg(windows)]
        let result = SystemExecutor.run("cmd", &["/C", "exit", "1"]);
        #[cfg(not(windows))]
        let result = SystemExecutor.run("false", &[]);
        assert!(result.is_err(), "non-zero exit should produce an error");
    }

    #[test]
    fn run_unchecked_failure() {
        #[cfg(windows)]
        let result = SystemExecutor.run_unchecked("cmd", &["/C", "exit", "1"]).unwrap();
        #[cfg(not(windows))]
        let result = SystemExecutor.run_unchecked("false", &[]).unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
    }

    #[test]
    fn run_unchecked_missing_program_is_error() {
        let result = SystemExecutor.run_unchecked("this-program-does-not-exist-12345", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn which_missing_program() {
        assert!(
            !SystemExecutor.which("this-program-does-not-exist-12345"),
            "non-existent program should not be found"
        );
    }

    #[test]
    fn failure_detail_prefers_stderr() {
        let result = ExecResult {
            stdout: "out".to_string(),
            stderr: " err \n".to_string(),
            success: false,
            code: Some(1),
        };
        assert_eq!(failure_detail(&result), "err");
    }

    #[test]
    fn failure_detail_falls_back_to_stdout() {
        let result = ExecResult {
            stdout: "No package found\n".to_string(),
            stderr: String::new(),
            success: false,
            code: Some(1),
        };
        assert_eq!(failure_detail(&result), "No package found");
    }

    #[test]
    fn encode_powershell_is_utf16le_base64() {
        // "ab" -> 61 00 62 00
        assert_eq!(encode_powershell("ab"), "YQBiAA==");
    }

    #[test]
    fn ps_quote_escapes_single_quotes() {
        assert_eq!(ps_quote("C:\\it's"), "'C:\\it''s'");
    }
}
