//! User-tunable settings with built-in defaults.
use serde::Deserialize;
use std::path::PathBuf;

/// Archive of the profile pack (a GitHub branch snapshot).
pub const DEFAULT_PROFILE_PACK_URL: &str =
    "https://github.com/profile-bootstrap/powershell-profile/archive/refs/heads/main.zip";

/// Name of the theme bundle nested inside the profile pack.
pub const DEFAULT_THEME_ARCHIVE: &str = "themes.zip";

/// GitHub repository publishing Nerd Font release assets.
pub const DEFAULT_NERD_FONTS_REPO: &str = "ryanoasis/nerd-fonts";

/// winget identifier of the prompt theming engine.
pub const DEFAULT_OH_MY_POSH_ID: &str = "JanDeDobbeleer.OhMyPosh";

/// Settings loaded from the optional TOML file.
///
/// Every field has a default, so an absent file or a file that sets only a
/// few keys is valid.
///
/// ```toml
/// profile_pack_url = "https://github.com/me/pwsh-profile/archive/refs/heads/main.zip"
/// buckets = ["extras", "nerd-fonts"]
/// apps = ["git", "fzf"]
/// default_fonts = ["CascadiaCode"]
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// URL of the profile pack archive.
    pub profile_pack_url: String,
    /// File name of the theme bundle inside the profile pack.
    pub theme_archive: String,
    /// Destination for theme files; `~/.poshthemes` when unset.
    pub theme_dir: Option<PathBuf>,
    /// Scoop buckets to register.
    pub buckets: Vec<String>,
    /// Scoop apps to install.
    pub apps: Vec<String>,
    /// PowerShell modules to install for the current user.
    pub modules: Vec<String>,
    /// Nerd Font families installed when `--fonts` is not given.
    pub default_fonts: Vec<String>,
    /// GitHub `owner/repo` publishing the Nerd Font release.
    pub nerd_fonts_repo: String,
    /// winget identifier used to install oh-my-posh.
    pub oh_my_posh_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile_pack_url: DEFAULT_PROFILE_PACK_URL.to_string(),
            theme_archive: DEFAULT_THEME_ARCHIVE.to_string(),
            theme_dir: None,
            buckets: to_strings(&["main", "extras", "nerd-fonts"]),
            apps: to_strings(&["git", "fzf", "zoxide", "ripgrep", "bat"]),
            modules: to_strings(&["Terminal-Icons", "PSReadLine", "posh-git"]),
            default_fonts: to_strings(&["CascadiaCode", "FiraCode", "JetBrainsMono", "Meslo"]),
            nerd_fonts_repo: DEFAULT_NERD_FONTS_REPO.to_string(),
            oh_my_posh_id: DEFAULT_OH_MY_POSH_ID.to_string(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}
