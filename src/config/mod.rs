pub mod settings;
pub mod toml_loader;

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::platform::Platform;

pub use settings::Settings;

/// Which Nerd Font packages the font step installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSelection {
    /// Every `.zip` asset of the latest release.
    All,
    /// The named families, one archive each.
    Named(Vec<String>),
}

/// Immutable run configuration, built once from the command line and the
/// optional settings file.
#[derive(Debug, Clone)]
pub struct Config {
    /// Replace existing profile and theme files after backing them up.
    pub overwrite_existing: bool,
    /// Do not install fonts.
    pub skip_fonts: bool,
    /// Do not install oh-my-posh.
    pub skip_oh_my_posh: bool,
    /// Do not add scoop buckets or install scoop apps.
    pub skip_scoop_apps: bool,
    /// Font packages to install.
    pub fonts: FontSelection,
    /// Values from the settings file, or the built-in defaults.
    pub settings: Settings,
}

impl Config {
    /// Build the configuration from parsed flags.
    ///
    /// An explicit `--config` path must exist. Without one, the settings file
    /// at [`default_settings_path`] is used when present and the built-in
    /// defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if an explicit settings file is
    /// missing, or [`ConfigError::Invalid`] if the settings cannot be parsed.
    pub fn from_cli(cli: &Cli, platform: &Platform) -> Result<Self, ConfigError> {
        let settings: Settings = match &cli.config {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.clone())),
            Some(path) => toml_loader::load_config(path)?,
            None => toml_loader::load_config(&default_settings_path(&platform.home))?,
        };
        Ok(Self::from_parts(cli, settings))
    }

    /// Combine flags with already-loaded settings.
    #[must_use]
    pub fn from_parts(cli: &Cli, settings: Settings) -> Self {
        let fonts = if cli.all_nerd_fonts {
            FontSelection::All
        } else if cli.fonts.is_empty() {
            FontSelection::Named(settings.default_fonts.clone())
        } else {
            FontSelection::Named(
                cli.fonts
                    .iter()
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect(),
            )
        };

        Self {
            overwrite_existing: cli.overwrite_existing,
            skip_fonts: cli.skip_fonts,
            skip_oh_my_posh: cli.skip_oh_my_posh,
            skip_scoop_apps: cli.skip_scoop_apps,
            fonts,
            settings,
        }
    }

    /// Theme directory: the configured one, else the platform default.
    #[must_use]
    pub fn theme_dir(&self, platform: &Platform) -> PathBuf {
        self.settings
            .theme_dir
            .clone()
            .unwrap_or_else(|| platform.default_theme_dir())
    }
}

/// `~/.config/profile-bootstrap/bootstrap.toml`
#[must_use]
pub fn default_settings_path(home: &Path) -> PathBuf {
    home.join(".config")
        .join("profile-bootstrap")
        .join("bootstrap.toml")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Os;
    use clap::Parser;

    fn platform_in(dir: &Path) -> Platform {
        Platform::new(Os::Linux, dir)
    }

    #[test]
    fn defaults_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["bootstrap"]);
        let config = Config::from_cli(&cli, &platform_in(dir.path())).unwrap();
        assert!(!config.overwrite_existing);
        assert_eq!(
            config.fonts,
            FontSelection::Named(Settings::default().default_fonts)
        );
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn explicit_missing_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "bootstrap",
            "--config",
            dir.path().join("nope.toml").to_str().unwrap(),
        ]);
        let err = Config::from_cli(&cli, &platform_in(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn settings_file_in_home_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = default_settings_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "apps = [\"7zip\"]\n").unwrap();

        let cli = Cli::parse_from(["bootstrap"]);
        let config = Config::from_cli(&cli, &platform_in(dir.path())).unwrap();
        assert_eq!(config.settings.apps, vec!["7zip"]);
    }

    #[test]
    fn all_nerd_fonts_wins_over_font_list() {
        let cli = Cli::parse_from(["bootstrap", "--all-nerd-fonts", "--fonts", "Hack"]);
        let config = Config::from_parts(&cli, Settings::default());
        assert_eq!(config.fonts, FontSelection::All);
    }

    #[test]
    fn font_list_is_trimmed() {
        let cli = Cli::parse_from(["bootstrap", "--fonts", " Hack ,,Meslo"]);
        let config = Config::from_parts(&cli, Settings::default());
        assert_eq!(
            config.fonts,
            FontSelection::Named(vec!["Hack".to_string(), "Meslo".to_string()])
        );
    }

    #[test]
    fn theme_dir_falls_back_to_platform_default() {
        let cli = Cli::parse_from(["bootstrap"]);
        let platform = Platform::new(Os::Linux, "/home/u");
        let mut config = Config::from_parts(&cli, Settings::default());
        assert_eq!(config.theme_dir(&platform), PathBuf::from("/home/u/.poshthemes"));

        config.settings.theme_dir = Some(PathBuf::from("/themes"));
        assert_eq!(config.theme_dir(&platform), PathBuf::from("/themes"));
    }
}
