//! Workstation bootstrap engine.
//!
//! Brings a machine to a known shell setup in one idempotent run: execution
//! policy, scoop buckets and apps, PowerShell modules, oh-my-posh, the
//! profile pack (with backups of anything it replaces) and Nerd Fonts.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: flags plus the optional TOML settings file
//! - **[`resources`]**: idempotent `check + apply` primitives (buckets, apps, fonts, ...)
//! - **[`fetch`]** and **[`deploy`]**: download with transport fallback, extract and place files
//! - **[`steps`]**: named, ordered units of work wired to resources
//! - **[`commands`]**: elevation gate, context construction and the pipeline run
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod elevation;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod steps;
