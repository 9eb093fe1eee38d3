//! Nerd Font installation.
//!
//! Each package is a release asset of the Nerd Fonts repository: a zip of
//! `.ttf`/`.otf` files. Packages are handled one at a time; a failed package
//! is recorded and the batch moves on.
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Deserialize;

use super::{Context, Step, StepResult, attempt};
use crate::config::FontSelection;
use crate::deploy;
use crate::fetch::Fetcher;
use crate::logging::Log;
use crate::resources::font::{FontFileResource, FontRegistrar};
use crate::resources::fs::files_with_extensions;
use crate::resources::{self, ResourceChange};

const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// A downloadable font archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontPackage {
    /// Asset file name, e.g. `FiraCode.zip`.
    pub archive_name: String,
    /// Where the archive is downloaded from.
    pub download_url: String,
}

impl FontPackage {
    /// Package name without the `.zip` suffix.
    #[must_use]
    pub fn name(&self) -> &str {
        self.archive_name
            .strip_suffix(".zip")
            .unwrap_or(&self.archive_name)
    }
}

/// Outcome of a font batch, by package name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FontBatchReport {
    /// Packages whose font files are all present afterwards.
    pub installed: Vec<String>,
    /// Packages that could not be fetched, extracted or installed.
    pub failed: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Release {
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

/// Packages for named font families, from the latest release of `repo`.
#[must_use]
pub fn named_packages(repo: &str, names: &[String]) -> Vec<FontPackage> {
    names
        .iter()
        .map(|name| FontPackage {
            archive_name: format!("{name}.zip"),
            download_url: format!(
                "https://github.com/{repo}/releases/latest/download/{name}.zip"
            ),
        })
        .collect()
}

/// Every `.zip` asset of the latest release of `repo`.
///
/// # Errors
///
/// Returns an error if the release listing cannot be retrieved or parsed.
pub fn release_packages(fetcher: &Fetcher, repo: &str) -> Result<Vec<FontPackage>> {
    let url = format!("https://api.github.com/repos/{repo}/releases/latest");
    let release: Release = fetcher
        .get_json(&url)
        .context("listing Nerd Font release assets")?;
    Ok(release
        .assets
        .into_iter()
        .filter(|a| a.name.to_ascii_lowercase().ends_with(".zip"))
        .map(|a| FontPackage {
            archive_name: a.name,
            download_url: a.browser_download_url,
        })
        .collect())
}

/// Fetch, extract and install every package.
///
/// A package counts as installed when all of its font files are present
/// afterwards.
pub fn install_font_packages(
    fetcher: &Fetcher,
    registrar: &dyn FontRegistrar,
    packages: &[FontPackage],
    log: &dyn Log,
) -> FontBatchReport {
    let mut report = FontBatchReport::default();
    for package in packages {
        match install_package(fetcher, registrar, package, log) {
            Ok(()) => report.installed.push(package.name().to_string()),
            Err(e) => {
                log.warn(&format!("font {}: {e:#}", package.name()));
                report.failed.push(package.name().to_string());
            }
        }
    }
    report
}

fn install_package(
    fetcher: &Fetcher,
    registrar: &dyn FontRegistrar,
    package: &FontPackage,
    log: &dyn Log,
) -> Result<()> {
    let scratch = tempfile::tempdir().context("creating scratch directory")?;
    let archive = scratch.path().join(&package.archive_name);
    let extracted = scratch.path().join("fonts");

    fetcher.fetch(&package.download_url, &archive)?;
    deploy::extract_zip(&archive, &extracted)?;
    install_files(registrar, &extracted, package.name(), log)
}

fn install_files(
    registrar: &dyn FontRegistrar,
    extracted: &Path,
    name: &str,
    log: &dyn Log,
) -> Result<()> {
    let files = files_with_extensions(extracted, &FONT_EXTENSIONS)?;
    if files.is_empty() {
        anyhow::bail!("archive contains no font files");
    }

    let (mut added, mut present) = (0usize, 0usize);
    for file in files {
        let resource = FontFileResource::new(file, registrar)?;
        match resources::ensure(&resource)? {
            ResourceChange::Applied => added += 1,
            _ => present += 1,
        }
    }
    log.info(&format!("{name}: {added} installed, {present} already present"));
    Ok(())
}

/// Install Nerd Fonts system-wide.
#[derive(Debug)]
pub struct InstallFonts;

impl Step for InstallFonts {
    fn name(&self) -> &'static str {
        "Install fonts"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.skip_fonts
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let repo = &ctx.config.settings.nerd_fonts_repo;
        let packages = match &ctx.config.fonts {
            FontSelection::All => release_packages(&ctx.fetcher, repo)?,
            FontSelection::Named(names) => named_packages(repo, names),
        };
        if packages.is_empty() {
            return Ok(StepResult::Skipped("no fonts selected".to_string()));
        }
        ctx.log.debug(&format!(
            "installing {} font package(s) into {}",
            packages.len(),
            ctx.fonts.fonts_dir().display()
        ));

        let report = install_font_packages(&ctx.fetcher, &*ctx.fonts, &packages, &*ctx.log);
        if !report.installed.is_empty() {
            // Running applications pick the new fonts up without a logoff.
            if attempt(|| ctx.fonts.broadcast()).is_none() {
                ctx.log.debug("font change notification not delivered");
            }
        }

        ctx.log.info(&format!(
            "{} installed, {} failed",
            report.installed.len(),
            report.failed.len()
        ));
        if report.failed.is_empty() {
            Ok(StepResult::Ok)
        } else {
            anyhow::bail!(
                "failed fonts: {}; re-run the bootstrap to retry",
                report.failed.join(", ")
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::fetch::Transport;
    use crate::resources::font::test_helpers::DirRegistrar;
    use crate::steps::test_helpers::RecordingLog;
    use anyhow::Context as _;
    use std::collections::HashMap;
    use std::io::Write as _;
    use std::path::PathBuf;

    /// Serves canned bodies by URL; unknown URLs fail.
    #[derive(Debug, Default)]
    struct Canned(HashMap<String, Vec<u8>>);

    impl Transport for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn download(&self, url: &str, dest: &Path) -> Result<()> {
            let body = self.0.get(url).context("404")?;
            std::fs::write(dest, body)?;
            Ok(())
        }
    }

    fn font_zip(files: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for name in files {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"font").unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn fetcher(bodies: Vec<(String, Vec<u8>)>) -> Fetcher {
        Fetcher::with_transports(vec![Box::new(Canned(bodies.into_iter().collect()))])
    }

    #[test]
    fn named_package_urls() {
        let packages = named_packages("ryanoasis/nerd-fonts", &["FiraCode".to_string()]);
        assert_eq!(
            packages,
            vec![FontPackage {
                archive_name: "FiraCode.zip".to_string(),
                download_url:
                    "https://github.com/ryanoasis/nerd-fonts/releases/latest/download/FiraCode.zip"
                        .to_string(),
            }]
        );
        assert_eq!(packages[0].name(), "FiraCode");
    }

    #[test]
    fn release_listing_keeps_zip_assets() {
        let listing = br#"{"tag_name":"v3.2.1","assets":[
            {"name":"FiraCode.zip","browser_download_url":"https://x/FiraCode.zip"},
            {"name":"FiraCode.tar.xz","browser_download_url":"https://x/FiraCode.tar.xz"},
            {"name":"Meslo.ZIP","browser_download_url":"https://x/Meslo.ZIP"}
        ]}"#;
        let fetcher = fetcher(vec![(
            "https://api.github.com/repos/ryanoasis/nerd-fonts/releases/latest".to_string(),
            listing.to_vec(),
        )]);

        let packages = release_packages(&fetcher, "ryanoasis/nerd-fonts").unwrap();
        let names: Vec<_> = packages.iter().map(|p| p.archive_name.as_str()).collect();
        assert_eq!(names, vec!["FiraCode.zip", "Meslo.ZIP"]);
    }

    #[test]
    fn installs_font_files_and_registers_them() {
        let fonts = tempfile::tempdir().unwrap();
        let registrar = DirRegistrar::new(fonts.path());
        let packages = named_packages("r/nf", &["FiraCode".to_string()]);
        let fetcher = fetcher(vec![(
            packages[0].download_url.clone(),
            font_zip(&["FiraCodeNerdFont-Regular.ttf", "README.md", "sub/FiraMono.otf"]),
        )]);
        let log = RecordingLog::default();

        let report = install_font_packages(&fetcher, &registrar, &packages, &log);
        assert_eq!(report.installed, vec!["FiraCode"]);
        assert!(fonts.path().join("FiraCodeNerdFont-Regular.ttf").is_file());
        assert!(fonts.path().join("FiraMono.otf").is_file());
        assert!(!fonts.path().join("README.md").exists());
        let registered: Vec<PathBuf> = registrar.registered.lock().unwrap().clone();
        assert_eq!(registered.len(), 2);
    }

    #[test]
    fn archive_without_fonts_fails_the_package() {
        let fonts = tempfile::tempdir().unwrap();
        let registrar = DirRegistrar::new(fonts.path());
        let packages = named_packages("r/nf", &["Empty".to_string()]);
        let fetcher = fetcher(vec![(
            packages[0].download_url.clone(),
            font_zip(&["LICENSE"]),
        )]);

        let report =
            install_font_packages(&fetcher, &registrar, &packages, &RecordingLog::default());
        assert_eq!(report.failed, vec!["Empty"]);
    }

    #[test]
    fn already_installed_fonts_are_not_registered_again() {
        let fonts = tempfile::tempdir().unwrap();
        std::fs::write(fonts.path().join("Meslo.ttf"), "old").unwrap();
        let registrar = DirRegistrar::new(fonts.path());
        let packages = named_packages("r/nf", &["Meslo".to_string()]);
        let fetcher = fetcher(vec![(packages[0].download_url.clone(), font_zip(&["Meslo.ttf"]))]);
        let log = RecordingLog::default();

        let report = install_font_packages(&fetcher, &registrar, &packages, &log);
        assert_eq!(report.installed, vec!["Meslo"]);
        assert!(registrar.registered.lock().unwrap().is_empty());
        assert!(log.lines().iter().any(|l| l == "Meslo: 0 installed, 1 already present"));
    }
}
