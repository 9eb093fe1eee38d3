//! TOML settings file parsing.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Deserialize a TOML file into `T`.
///
/// A missing file deserializes from empty TOML so that every `#[serde(default)]`
/// field falls back to its built-in value.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the file cannot be read or parsed.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        path: path.display().to_string(),
        message,
    };

    if !path.exists() {
        return toml::from_str("").map_err(|e| invalid(e.to_string()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    toml::from_str(&content).map_err(|e| invalid(e.message().to_string()))
}
