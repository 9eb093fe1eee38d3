use std::ffi::OsString;

use anyhow::{Result, anyhow};
use clap::Parser;

/// Command-line flags for the bootstrap entry point.
///
/// Parsed once at startup and frozen into a [`Config`](crate::config::Config);
/// no component reads these flags directly.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "bootstrap",
    about = "Bootstrap a workstation: shell policy, scoop, modules, oh-my-posh, profile pack and fonts",
    version
)]
pub struct Cli {
    /// Overwrite existing profile and theme files (originals are backed up first)
    #[arg(long)]
    pub overwrite_existing: bool,

    /// Skip Nerd Font installation
    #[arg(long)]
    pub skip_fonts: bool,

    /// Install every Nerd Font from the latest release instead of the default set
    #[arg(long)]
    pub all_nerd_fonts: bool,

    /// Skip oh-my-posh installation
    #[arg(long)]
    pub skip_oh_my_posh: bool,

    /// Skip scoop buckets and apps
    #[arg(long)]
    pub skip_scoop_apps: bool,

    /// Nerd Font families to install (e.g. FiraCode,JetBrainsMono)
    #[arg(long, value_delimiter = ',')]
    pub fonts: Vec<String>,

    /// Path to a TOML settings file overriding the built-in defaults
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments to forward to an elevated relaunch, without the program name.
///
/// # Errors
///
/// Returns an error naming the first argument that is not valid UTF-8.
pub fn forwarded_args(args: impl IntoIterator<Item = OsString>) -> Result<Vec<String>> {
    args.into_iter()
        .skip(1)
        .map(|arg| {
            arg.into_string().map_err(|bad| {
                anyhow!("argument is not valid UTF-8: {}", bad.to_string_lossy())
            })
        })
        .collect()
}
