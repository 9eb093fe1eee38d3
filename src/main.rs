use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use profile_bootstrap::cli::{self, Cli};
use profile_bootstrap::commands::provision;
use profile_bootstrap::elevation::TerminalConfirm;
use profile_bootstrap::logging::{self, Logger};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let cli = Cli::parse();
    let args = cli::forwarded_args(std::env::args_os())?;
    logging::init_subscriber(cli.verbose, "bootstrap");
    let log = Arc::new(Logger::new("bootstrap"));

    provision::run(&cli, &args, &TerminalConfirm, &log)?;
    Ok(())
}
