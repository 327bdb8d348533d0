// src/dag/registry.rs

//! Built-in task declarations.
//!
//! The task graph is declared in code, not in the config file: the pipeline
//! always consists of the same four tasks, and only the paths, globs and
//! browser targets they operate on come from [`Settings`].

use crate::config::Settings;
use crate::engine::TaskName;

/// Compile the entry stylesheet, prefix it and write it out.
pub const COMPILE_STYLES: &str = "compile-styles";
/// Reverse proxy with live-reload injection in front of the site server.
pub const DEV_SERVER: &str = "dev-server";
/// Standing filesystem watch that re-triggers `compile-styles`.
pub const WATCH_STYLES: &str = "watch-styles";
/// Aggregate entry point: dev server + style watcher.
pub const DEFAULT: &str = "default";

/// What a task does when dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// One compile cycle; runs to completion.
    CompileStyles,
    /// Long-lived proxy/live-reload server.
    DevServer,
    /// Long-lived filesystem watcher.
    WatchStyles,
    /// No action of its own; exists only to aggregate prerequisites.
    Aggregate,
}

impl TaskKind {
    /// Long-lived tasks start once per session and stay running.
    pub fn is_service(&self) -> bool {
        matches!(self, TaskKind::DevServer | TaskKind::WatchStyles)
    }
}

/// File-watch binding attached to a task: when a filesystem change event
/// matches `patterns`, one trigger for `triggers` is enqueued.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    pub patterns: Vec<String>,
    pub triggers: TaskName,
}

/// A declared task: name, action kind, prerequisites and optional watch
/// binding.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Prerequisites: tasks that must complete before this one runs.
    pub after: Vec<TaskName>,
    pub watch: Option<WatchBinding>,
}

impl TaskSpec {
    pub fn new(name: impl Into<TaskName>, kind: TaskKind) -> Self {
        Self {
            name: name.into(),
            kind,
            after: Vec::new(),
            watch: None,
        }
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.after = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn watch(mut self, patterns: &[String], triggers: &str) -> Self {
        self.watch = Some(WatchBinding {
            patterns: patterns.to_vec(),
            triggers: triggers.to_string(),
        });
        self
    }
}

/// The four built-in tasks, in registration order.
///
/// Registration order is also the tie-break order when several tasks become
/// ready at once, so it is part of the observable behaviour.
pub fn builtin_tasks(settings: &Settings) -> Vec<TaskSpec> {
    vec![
        TaskSpec::new(COMPILE_STYLES, TaskKind::CompileStyles),
        TaskSpec::new(DEV_SERVER, TaskKind::DevServer).after(&[COMPILE_STYLES]),
        TaskSpec::new(WATCH_STYLES, TaskKind::WatchStyles)
            .watch(&settings.styles.watch, COMPILE_STYLES),
        TaskSpec::new(DEFAULT, TaskKind::Aggregate).after(&[DEV_SERVER, WATCH_STYLES]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_graph_shape() {
        let specs = builtin_tasks(&Settings::default());
        assert_eq!(specs.len(), 4);

        let dev = specs.iter().find(|s| s.name == DEV_SERVER).unwrap();
        assert_eq!(dev.after, vec![COMPILE_STYLES.to_string()]);
        assert!(dev.kind.is_service());

        let watch = specs.iter().find(|s| s.name == WATCH_STYLES).unwrap();
        let binding = watch.watch.as_ref().unwrap();
        assert_eq!(binding.triggers, COMPILE_STYLES);
        assert!(!binding.patterns.is_empty());

        let default = specs.iter().find(|s| s.name == DEFAULT).unwrap();
        assert_eq!(default.kind, TaskKind::Aggregate);
        assert_eq!(default.after.len(), 2);
    }
}
