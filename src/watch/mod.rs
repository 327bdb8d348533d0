// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Compiling a task's watch glob patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning filesystem change events into task triggers, one trigger per
//!   detected event.
//!
//! It does **not** know about the DAG; the runtime decides what a trigger
//! means.

pub mod patterns;
pub mod watcher;

pub use patterns::WatchProfile;
pub use watcher::{spawn_watcher, WatcherHandle};
