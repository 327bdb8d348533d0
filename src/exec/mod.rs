// src/exec/mod.rs

//! Task execution.
//!
//! The runtime talks to a [`TaskExecutor`] instead of running actions
//! directly. This makes it easy to swap in a fake executor in tests while
//! keeping the production executor implementation in [`backend`].

pub mod backend;

pub use backend::{PipelineExecutor, TaskExecutor};
