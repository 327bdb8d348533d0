use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use stylesync::styles::ChangeNotifier;

/// What a pipeline cycle reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Updated { name: String, bytes: usize },
    Failed { path: PathBuf, message: String },
}

/// A `ChangeNotifier` that records every notification for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::Failed { .. }))
            .collect()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn stylesheet_updated(&self, name: &str, css: &str) {
        self.notifications.lock().unwrap().push(Notification::Updated {
            name: name.to_string(),
            bytes: css.len(),
        });
    }

    fn compile_failed(&self, path: &Path, message: &str) {
        self.notifications.lock().unwrap().push(Notification::Failed {
            path: path.to_path_buf(),
            message: message.to_string(),
        });
    }
}
