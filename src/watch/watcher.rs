// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::watch::patterns::WatchProfile;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher observing `root` recursively, sending
/// `RuntimeEvent::TaskTriggered` for each change event whose path set
/// matches a profile.
///
/// One trigger is sent per profile per detected event, never per path, so a
/// save that touches several watched files still causes a single
/// recompilation.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<WatchProfile>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so event paths strip cleanly.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // No tracing subscriber guarantees inside the notify
                    // callback thread; fall back to stderr.
                    eprintln!("stylesync: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("stylesync: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(root = %root.display(), "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            for task in triggers_for_event(&profiles, &root, &event) {
                let send = runtime_tx
                    .send(RuntimeEvent::TaskTriggered {
                        task,
                        reason: TriggerReason::FileWatch,
                    })
                    .await;
                if send.is_err() {
                    debug!("runtime channel closed; stopping watch forwarding");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Tasks to trigger for one change event: at most one per profile.
fn triggers_for_event(
    profiles: &[WatchProfile],
    root: &Path,
    event: &Event,
) -> Vec<TaskName> {
    if !is_mutating(&event.kind) {
        return Vec::new();
    }

    profiles
        .iter()
        .filter(|profile| {
            event.paths.iter().any(|path| {
                path.strip_prefix(root)
                    .map(|rel| {
                        let rel = rel.to_string_lossy().replace('\\', "/");
                        profile.matches(&rel)
                    })
                    .unwrap_or(false)
            })
        })
        .map(|profile| profile.trigger().to_string())
        .collect()
}

/// Only events that can change file content are interesting; access
/// notifications and metadata chatter are not.
fn is_mutating(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
