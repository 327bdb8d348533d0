// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::{Result, StylesyncError};
use crate::exec::TaskExecutor;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the DAG scheduler in response to [`RuntimeEvent`]s and delegates
/// actual task execution to a [`TaskExecutor`].
///
/// This is a pure IO shell around [`CoreRuntime`], which contains all the
/// runtime semantics. This struct handles async IO: reading events from the
/// channel and dispatching tasks to the executor.
pub struct Runtime<E: TaskExecutor> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: TaskExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: TaskExecutor> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes [`RuntimeEvent`]s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes the commands returned by the core.
    ///
    /// Returns an error when the session ended with failed tasks and the
    /// operator did not ask for the shutdown (one-off run failed, or a
    /// service died).
    pub async fn run(mut self) -> Result<()> {
        info!("stylesync runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");

        if !self.core.shutdown_was_requested() && !self.core.failed_tasks().is_empty() {
            return Err(StylesyncError::TaskFailed(
                self.core.failed_tasks().join(", "),
            ));
        }

        Ok(())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                if tasks.is_empty() {
                    return Ok(());
                }
                let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
                debug!(?names, "dispatching ready tasks");
                self.executor.dispatch(tasks).await?;
            }
            CoreCommand::RequestExit => {
                // The core also returns keep_running = false in this case,
                // so there is nothing to do beyond logging.
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }
}
