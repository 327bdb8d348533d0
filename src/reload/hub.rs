// src/reload/hub.rs

//! Broadcast hub connecting the compile pipeline to WebSocket clients.

use std::path::Path;

use tokio::sync::broadcast;
use tracing::debug;

use crate::reload::message::ReloadMessage;
use crate::styles::ChangeNotifier;

/// Capacity of the broadcast channel; slow clients that lag behind simply
/// miss intermediate updates.
const CHANNEL_CAPACITY: usize = 64;

/// Fan-out point for live-reload messages.
///
/// Cheap to clone; all clones publish into the same channel. Publishing with
/// no connected clients is a no-op, so one-off compile runs work unchanged.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe a new client.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Number of currently connected receivers.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish a message to every connected client.
    pub fn publish(&self, msg: ReloadMessage) {
        match self.tx.send(msg) {
            Ok(receivers) => debug!(receivers, "reload message published"),
            Err(_) => debug!("reload message dropped; no connected clients"),
        }
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier for ReloadHub {
    fn stylesheet_updated(&self, name: &str, css: &str) {
        self.publish(ReloadMessage::css(name, css));
    }

    fn compile_failed(&self, path: &Path, message: &str) {
        self.publish(ReloadMessage::error(
            path.display().to_string(),
            message,
        ));
    }
}
