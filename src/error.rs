//! Domain-specific error types for the bootstrap engine.
//!
//! Internal modules return typed errors (e.g. [`FetchError`], [`DeployError`]).
//! Steps wrap those in [`anyhow::Error`]; only the errors that can end the
//! run reach [`BootstrapError`].
//!
//! # Error hierarchy
//!
//! ```text
//! BootstrapError
//! ├── Config(ConfigError)       — settings file loading
//! ├── Step(StepError)           — fatal step failures
//! └── Elevation(ElevationError) — privilege check and relaunch
//!
//! FetchError   — download transport failures (inside steps)
//! DeployError  — archive extraction and file placement (inside steps)
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the bootstrap engine.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A fatal step failed.
    #[error("Step error: {0}")]
    Step(#[from] StepError),

    /// Privilege elevation failed or was declined.
    #[error("Elevation error: {0}")]
    Elevation(#[from] ElevationError),
}

/// Errors that arise while loading the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested settings file does not exist.
    #[error("settings file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The settings file could not be parsed.
    #[error("invalid settings in {path}: {message}")]
    Invalid {
        /// Path of the offending file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// Neither `USERPROFILE` nor `HOME` is set.
    #[error("cannot determine home directory (HOME/USERPROFILE unset)")]
    NoHome,
}

/// Errors raised by the step orchestrator.
#[derive(Error, Debug)]
pub enum StepError {
    /// A step declared fatal failed; the run halts.
    #[error("fatal step '{step}' failed: {reason}")]
    Fatal {
        /// Name of the step that failed.
        step: String,
        /// Rendered failure chain.
        reason: String,
    },
}

/// Errors raised by the resource fetcher.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No transport is available in this environment.
    #[error("no download transport available for {url}")]
    NoTransport {
        /// Requested URL.
        url: String,
    },

    /// Every available transport failed.
    #[error("download of {url} failed: {}", .attempts.join("; "))]
    AllTransportsFailed {
        /// Requested URL.
        url: String,
        /// One `"<transport>: <error>"` entry per attempted transport.
        attempts: Vec<String>,
    },
}

/// Errors raised by the archive deployer.
#[derive(Error, Debug)]
pub enum DeployError {
    /// The archive could not be opened or read.
    #[error("cannot read archive {}: {reason}", .path.display())]
    Archive {
        /// Path to the archive.
        path: PathBuf,
        /// Reason reported by the zip reader.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        /// Short description of the operation (e.g. `"copy"`).
        op: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl DeployError {
    /// Wrap an I/O error with the operation and path it concerned.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the elevation gate.
#[derive(Error, Debug)]
pub enum ElevationError {
    /// The user declined to relaunch with administrator privileges.
    #[error("administrator privileges are required; re-run from an elevated shell or accept the prompt")]
    Declined,

    /// The prompt could not be shown (e.g. no interactive terminal).
    #[error("cannot prompt for elevation: {0}")]
    Prompt(String),

    /// The elevated relaunch could not be started.
    #[error("failed to relaunch with elevated privileges: {0}")]
    Relaunch(String),
}
