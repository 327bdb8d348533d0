// src/styles/pipeline.rs

//! One compile cycle: compile the entry file, prefix, write, notify.
//!
//! A Sass error is a soft outcome here: it is handed to the
//! [`ChangeNotifier`] and the cycle produces no output, but the caller sees
//! `Ok(CycleOutcome::CompileFailed)` so the watch session keeps going. Only
//! infrastructure problems (unwritable output directory, invalid browser
//! list, CSS printer failure) surface as hard errors.

use std::fs;
use std::path::{Path, PathBuf};

use lightningcss::targets::Browsers;
use tracing::{info, warn};

use crate::config::StylesSettings;
use crate::errors::Result;
use crate::styles::compile::compile_entry;
use crate::styles::prefix::{apply_prefixes, browser_targets};

/// Receiver for per-cycle notifications.
///
/// In production this is the live-reload hub; tests substitute a recording
/// implementation.
pub trait ChangeNotifier: Send + Sync {
    /// A fresh stylesheet was written; `css` is its full text.
    fn stylesheet_updated(&self, name: &str, css: &str);

    /// The entry (or one of its imports) failed to compile.
    fn compile_failed(&self, path: &Path, message: &str);
}

/// Result of one compile cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// CSS written to `path`.
    Written { path: PathBuf, bytes: usize },
    /// Sass failed to compile; the notifier was informed and no output was
    /// produced this cycle.
    CompileFailed,
}

/// Resolved, ready-to-run stylesheet pipeline.
#[derive(Debug, Clone)]
pub struct StylePipeline {
    entry: PathBuf,
    include_paths: Vec<PathBuf>,
    out_dir: PathBuf,
    browsers: Browsers,
}

impl StylePipeline {
    /// Resolve settings against the project root and parse the browser
    /// target list once.
    pub fn from_settings(root: &Path, settings: &StylesSettings) -> Result<Self> {
        let browsers = browser_targets(&settings.browsers)?;

        Ok(Self {
            entry: root.join(&settings.entry),
            include_paths: settings.include_paths.iter().map(|p| root.join(p)).collect(),
            out_dir: root.join(&settings.out_dir),
            browsers,
        })
    }

    /// Destination of the compiled stylesheet: entry stem + `.css` inside the
    /// output directory.
    pub fn output_path(&self) -> PathBuf {
        let stem = self
            .entry
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string());
        self.out_dir.join(format!("{stem}.css"))
    }

    /// Run one compile cycle.
    pub fn run_cycle(&self, notifier: &dyn ChangeNotifier) -> Result<CycleOutcome> {
        let css = match compile_entry(&self.entry, &self.include_paths) {
            Ok(css) => css,
            Err(err) => {
                warn!(path = %err.path.display(), error = %err.message, "sass compile failed");
                notifier.compile_failed(&err.path, &err.message);
                return Ok(CycleOutcome::CompileFailed);
            }
        };

        let prefixed = apply_prefixes(&css, &self.browsers)?;

        fs::create_dir_all(&self.out_dir)?;
        let path = self.output_path();
        fs::write(&path, &prefixed)?;

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(
            path = %path.display(),
            bytes = prefixed.len(),
            "stylesheet compiled"
        );
        notifier.stylesheet_updated(&name, &prefixed);

        Ok(CycleOutcome::Written {
            path,
            bytes: prefixed.len(),
        })
    }
}
