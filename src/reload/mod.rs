// src/reload/mod.rs

//! Live reload: message protocol and broadcast hub.
//!
//! The dev server forwards every message published on the hub to connected
//! browser clients over WebSocket; the compile pipeline publishes through
//! the [`ChangeNotifier`] impl on [`ReloadHub`].
//!
//! [`ChangeNotifier`]: crate::styles::ChangeNotifier

pub mod hub;
pub mod message;

pub use hub::ReloadHub;
pub use message::ReloadMessage;
