// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the trigger queue (what happens when triggers arrive while a run is
//!   active)
//! - the main runtime event loop that reacts to:
//!   - CLI and file-watch triggers
//!   - service readiness reports
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a dispatched task for the scheduler.
///
/// A Sass compile error is not a failure at this level: the compile task
/// routes it to the notifier and completes with `Success` so the session
/// continues. `Failed` means infrastructure broke (unwritable output
/// directory, a service that could not start).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The task the CLI invocation asked for.
    Cli,
    /// Triggered due to a filesystem change event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Exit the runtime once the DAG is idle and no triggers are queued.
    ///
    /// Set when the invoked task's closure contains no long-lived service,
    /// so one-off compile invocations terminate on their own while watch
    /// sessions run until Ctrl-C.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the CLI, watcher and executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task should be (logically) triggered.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// A long-lived service finished starting up.
    ServiceStarted { task: TaskName },
    /// A dispatched task finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod queue;
pub mod runtime;

pub use core::{CoreCommand, CoreRuntime, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
