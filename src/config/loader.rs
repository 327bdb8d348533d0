// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::Settings;
use crate::errors::{Result, StylesyncError};

/// Load settings from a given path.
///
/// This performs TOML deserialization plus the semantic checks in
/// [`validate`]; the file must exist.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let settings: Settings = toml::from_str(&contents)?;
    validate(&settings)?;

    Ok(settings)
}

/// Load settings from `path` if the file exists, otherwise return the
/// built-in defaults.
///
/// This is the entry point used for the implicit `stylesync.toml` lookup;
/// an explicitly-passed `--config` path goes through [`load_from_path`]
/// instead so that a typo'd path is an error rather than a silent default.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    if path.exists() {
        load_from_path(path)
    } else {
        debug!(path = %path.display(), "no config file found; using defaults");
        Ok(Settings::default())
    }
}

/// Default config path: `stylesync.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("stylesync.toml")
}

/// Semantic validation beyond what serde enforces.
fn validate(settings: &Settings) -> Result<()> {
    if settings.styles.entry.file_stem().is_none() {
        return Err(StylesyncError::ConfigError(
            "[styles].entry must name a stylesheet file".to_string(),
        ));
    }

    if settings.styles.browsers.is_empty() {
        return Err(StylesyncError::ConfigError(
            "[styles].browsers must list at least one browserslist query".to_string(),
        ));
    }

    if settings.styles.watch.is_empty() {
        return Err(StylesyncError::ConfigError(
            "[styles].watch must list at least one glob pattern".to_string(),
        ));
    }

    if settings.serve.upstream.is_empty() {
        return Err(StylesyncError::ConfigError(
            "[serve].upstream must name the site server address".to_string(),
        ));
    }

    Ok(())
}
