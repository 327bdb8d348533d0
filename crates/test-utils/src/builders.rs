#![allow(dead_code)]

use stylesync::config::{ServeSettings, Settings, StylesSettings};
use stylesync::dag::{TaskKind, TaskSpec};

/// Builder for `TaskSpec` to simplify scheduler and runtime test setup.
pub struct TaskSpecBuilder {
    spec: TaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            spec: TaskSpec::new(name, TaskKind::Aggregate),
        }
    }

    pub fn kind(mut self, kind: TaskKind) -> Self {
        self.spec.kind = kind;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.spec.after.push(dep.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str, triggers: &str) -> Self {
        self.spec = self.spec.watch(&[pattern.to_string()], triggers);
        self
    }

    pub fn build(self) -> TaskSpec {
        self.spec
    }
}

/// Settings pointing every path under the given root, for pipeline tests
/// that run against a temporary directory.
pub fn settings_under(root_relative_entry: &str, out_dir: &str) -> Settings {
    Settings {
        styles: StylesSettings {
            entry: root_relative_entry.into(),
            include_paths: vec![],
            out_dir: out_dir.into(),
            watch: vec!["assets/scss/**/*.scss".to_string()],
            browsers: vec!["ie 10".to_string(), "chrome 20".to_string()],
        },
        serve: ServeSettings::default(),
    }
}
