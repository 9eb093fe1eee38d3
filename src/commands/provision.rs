use std::sync::Arc;

use crate::cli::Cli;
use crate::config::Config;
use crate::elevation::{self, Confirm, Gate};
use crate::error::BootstrapError;
use crate::exec::{Executor, SystemExecutor};
use crate::fetch::Fetcher;
use crate::logging::{Log, Logger};
use crate::platform::Platform;
use crate::resources::font::SystemFontRegistrar;
use crate::steps::{self, Context};

/// Run the full bootstrap.
///
/// `args` are the raw command-line arguments after the program name; they
/// are forwarded unchanged if the run has to be relaunched elevated.
///
/// # Errors
///
/// Returns an error if elevation is declined or fails, the settings file is
/// invalid, or a fatal step fails. Non-fatal step failures only show up in
/// the summary.
pub fn run(
    cli: &Cli,
    args: &[String],
    confirm: &dyn Confirm,
    log: &Arc<Logger>,
) -> Result<(), BootstrapError> {
    let version = option_env!("BOOTSTRAP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("profile-bootstrap {version}"));

    let platform = Platform::detect()?;
    log.debug(&format!("platform: {}, home: {}", platform.os, platform.home.display()));
    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);

    log.stage("Checking privileges");
    if elevation::ensure_elevated(&*executor, &platform, confirm, args)? == Gate::Relaunched {
        log.info("continuing in the elevated process");
        return Ok(());
    }

    log.stage("Loading configuration");
    let config = Config::from_cli(cli, &platform)?;
    log.debug(&format!("fonts: {:?}", config.fonts));
    log.info(&format!(
        "{} bucket(s), {} app(s), {} module(s)",
        config.settings.buckets.len(),
        config.settings.apps.len(),
        config.settings.modules.len()
    ));

    let ctx = Context {
        fetcher: Arc::new(Fetcher::system(Arc::clone(&executor), &platform)),
        fonts: Arc::new(SystemFontRegistrar::new(&platform, Arc::clone(&executor))),
        config: Arc::new(config),
        platform: Arc::new(platform),
        log: Arc::clone(log) as Arc<dyn Log>,
        executor,
    };

    let result = steps::run_pipeline(&steps::all_steps(), &ctx);
    log.print_summary();
    result.map_err(BootstrapError::from)
}
