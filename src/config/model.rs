// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from `stylesync.toml`.
///
/// ```toml
/// [styles]
/// entry = "assets/scss/main.scss"
/// out_dir = "puzzle/static"
/// browsers = ["last 15 versions", "> 1%"]
///
/// [serve]
/// port = 3000
/// upstream = "localhost:5000"
/// ```
///
/// All sections are optional; missing values fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Stylesheet pipeline settings from `[styles]`.
    #[serde(default)]
    pub styles: StylesSettings,

    /// Dev server settings from `[serve]`.
    #[serde(default)]
    pub serve: ServeSettings,
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSettings {
    /// Entry stylesheet compiled each cycle. Imports are resolved relative to
    /// the entry file and the include paths.
    #[serde(default = "default_entry")]
    pub entry: PathBuf,

    /// Extra directories searched when resolving `@use` / `@import`.
    #[serde(default = "default_include_paths")]
    pub include_paths: Vec<PathBuf>,

    /// Directory the compiled CSS file is written into.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Glob patterns (relative to the project root) the style watcher
    /// observes.
    #[serde(default = "default_watch")]
    pub watch: Vec<String>,

    /// Browserslist queries the vendor-prefixer targets.
    ///
    /// The trailing legacy entries are carried over from the original target
    /// set; edit them here rather than in code.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSettings {
    /// Local port the dev proxy listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address of the already-running site server requests are forwarded to.
    #[serde(default = "default_upstream")]
    pub upstream: String,
}

fn default_entry() -> PathBuf {
    PathBuf::from("assets/scss/main.scss")
}

fn default_include_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("scss")]
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("puzzle/static")
}

fn default_watch() -> Vec<String> {
    vec!["assets/scss/**/*.scss".to_string()]
}

fn default_browsers() -> Vec<String> {
    ["last 15 versions", "> 1%", "ie 8", "ie 7"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_port() -> u16 {
    3000
}

fn default_upstream() -> String {
    "localhost:5000".to_string()
}

impl Default for StylesSettings {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            include_paths: default_include_paths(),
            out_dir: default_out_dir(),
            watch: default_watch(),
            browsers: default_browsers(),
        }
    }
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            upstream: default_upstream(),
        }
    }
}
