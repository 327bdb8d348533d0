// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::dag::registry::WatchBinding;
use crate::engine::TaskName;

/// Compiled watch patterns for one task binding.
///
/// Patterns are evaluated against paths relative to the project root, with
/// forward slashes (e.g. `"assets/scss/main.scss"`).
#[derive(Clone)]
pub struct WatchProfile {
    trigger: TaskName,
    glob_set: GlobSet,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    /// Compile a binding's glob patterns.
    pub fn compile(binding: &WatchBinding) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &binding.patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?;
            builder.add(glob);
        }
        let glob_set = builder
            .build()
            .with_context(|| format!("building globset for task '{}'", binding.triggers))?;

        Ok(Self {
            trigger: binding.triggers.clone(),
            glob_set,
        })
    }

    /// Task this profile triggers on a match.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Whether the given root-relative path is watched.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.glob_set.is_match(rel_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(patterns: &[&str]) -> WatchBinding {
        WatchBinding {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            triggers: "compile-styles".to_string(),
        }
    }

    #[test]
    fn scss_glob_matches_nested_sources_only() {
        let profile = WatchProfile::compile(&binding(&["assets/scss/**/*.scss"])).unwrap();

        assert!(profile.matches("assets/scss/main.scss"));
        assert!(profile.matches("assets/scss/partials/_nav.scss"));
        assert!(!profile.matches("assets/js/app.js"));
        assert!(!profile.matches("puzzle/static/main.css"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(WatchProfile::compile(&binding(&["assets/["])).is_err());
    }
}
