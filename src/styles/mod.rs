// src/styles/mod.rs

//! The stylesheet pipeline: Sass compilation, vendor prefixing, output.
//!
//! Compilation and prefixing are fully delegated (`grass`, `lightningcss`);
//! this module only wires them together and routes compile errors to the
//! change notifier instead of failing the session.

pub mod compile;
pub mod pipeline;
pub mod prefix;

pub use compile::{compile_entry, SassError};
pub use pipeline::{ChangeNotifier, CycleOutcome, StylePipeline};
pub use prefix::{apply_prefixes, browser_targets};
