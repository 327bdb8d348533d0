// src/reload/message.rs

//! Live-reload message protocol.
//!
//! JSON messages pushed from the dev server to browser clients:
//!
//! - `connected`: handshake after the WebSocket opens
//! - `css`: a stylesheet recompiled; swap it in place, no page reload
//! - `error`: compile failure; show the overlay

use serde::{Deserialize, Serialize};

/// Message sent over the live-reload WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Connection established.
    Connected {
        /// Server version for compatibility checks.
        version: String,
    },

    /// A stylesheet was recompiled; inject the new content in place.
    Css {
        /// Output file name (e.g. "main.css"), used to find the matching
        /// `<link>` tag.
        name: String,
        /// Full CSS text.
        content: String,
    },

    /// Compile failure; clients display it until the next successful `css`.
    Error { path: String, message: String },
}

impl ReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn css(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Css {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"connected"}"#.to_string())
    }

    /// Parse from a JSON string.
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
