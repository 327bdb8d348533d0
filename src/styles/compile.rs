// src/styles/compile.rs

//! Sass compilation via `grass`.

use std::fmt;
use std::path::{Path, PathBuf};

/// A Sass compile failure, owned so it can outlive the compiler's borrowed
/// error type and travel through the notification channel.
#[derive(Debug, Clone)]
pub struct SassError {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for SassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for SassError {}

/// Compile the entry stylesheet and its imports to expanded CSS.
///
/// `include_paths` are searched (in order) when resolving `@use` and
/// `@import`; the entry file's own directory is always searched first by the
/// compiler itself.
pub fn compile_entry(entry: &Path, include_paths: &[PathBuf]) -> Result<String, SassError> {
    let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
    for path in include_paths {
        options = options.load_path(path.clone());
    }

    grass::from_path(entry, &options).map_err(|err| SassError {
        path: entry.to_path_buf(),
        message: err.to_string(),
    })
}
