use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Context, Step, StepResult};
use crate::deploy::{self, DeployReport};
use crate::error::DeployError;

/// Download the profile pack and place it under every profile root, then
/// deploy its nested theme bundle.
#[derive(Debug)]
pub struct DeployProfilePack;

impl Step for DeployProfilePack {
    fn name(&self) -> &'static str {
        "Deploy profile pack"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let settings = &ctx.config.settings;
        let overwrite = ctx.config.overwrite_existing;
        let scratch = tempfile::tempdir().context("creating scratch directory")?;

        let pack = download_and_extract(ctx, &settings.profile_pack_url, scratch.path(), "pack")?;

        let mut failed = Vec::new();
        let results = deploy::deploy_to_roots(
            &pack,
            &ctx.platform.profile_roots(),
            overwrite,
            &[settings.theme_archive.as_str()],
            &*ctx.log,
        );
        for (root, result) in results {
            if let Some(name) = report_outcome(ctx, &root, result) {
                failed.push(name);
            }
        }

        let themes_archive = pack.join(&settings.theme_archive);
        if themes_archive.is_file() {
            let theme_dir = ctx.theme_dir();
            let result = deploy::extract_zip(&themes_archive, &scratch.path().join("themes"))
                .and_then(|()| deploy::single_root(&scratch.path().join("themes")))
                .and_then(|themes| deploy::deploy_tree(&themes, &theme_dir, overwrite, &*ctx.log));
            if let Some(name) = report_outcome(ctx, &theme_dir, result) {
                failed.push(name);
            }
        } else {
            ctx.log
                .debug(&format!("no {} in profile pack", settings.theme_archive));
        }

        if failed.is_empty() {
            Ok(StepResult::Ok)
        } else {
            anyhow::bail!(
                "failed: {}; re-run the bootstrap to retry",
                failed.join(", ")
            )
        }
    }
}

/// Fetch the archive at `url` and extract it below `scratch/<label>`.
///
/// Returns the archive's content root (its lone top-level directory, if it
/// has exactly one).
fn download_and_extract(ctx: &Context, url: &str, scratch: &Path, label: &str) -> Result<PathBuf> {
    let archive = scratch.join(format!("{label}.zip"));
    let extracted = scratch.join(label);
    ctx.log.debug(&format!("downloading {url}"));
    ctx.fetcher.fetch(url, &archive)?;
    deploy::extract_zip(&archive, &extracted)?;
    Ok(deploy::single_root(&extracted)?)
}

/// Log one deployment outcome; returns the destination name on failure.
fn report_outcome(
    ctx: &Context,
    dest: &Path,
    result: Result<DeployReport, DeployError>,
) -> Option<String> {
    match result {
        Ok(report) => {
            ctx.log.info(&format!("{}: {report}", dest.display()));
            None
        }
        Err(e) => {
            ctx.log.warn(&format!("{}: {e}", dest.display()));
            Some(dest.display().to_string())
        }
    }
}
