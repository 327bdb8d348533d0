// src/exec/backend.rs

//! Pluggable executor abstraction and the production implementation.
//!
//! - [`TaskExecutor`] is the trait the runtime dispatches through.
//! - [`PipelineExecutor`] runs the built-in task actions: a compile cycle on
//!   a blocking thread, the dev server and the style watcher as spawned
//!   services, aggregates as immediate completions.
//!
//! Every dispatched task eventually reports back to the runtime channel:
//! oneshots with `TaskCompleted`, services with `ServiceStarted` once ready
//! (and `TaskCompleted` only if they die).

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::dag::registry::{TaskKind, TaskSpec};
use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskName, TaskOutcome};
use crate::errors::{Result, StylesyncError};
use crate::reload::ReloadHub;
use crate::styles::StylePipeline;
use crate::watch::{spawn_watcher, WatchProfile, WatcherHandle};

/// Trait abstracting how scheduled tasks are executed.
///
/// Production code uses [`PipelineExecutor`]; tests provide implementations
/// that record dispatches and emit completion events directly.
pub trait TaskExecutor: Send {
    /// Dispatch the given tasks for execution.
    fn dispatch(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Everything a task action needs, shared across dispatches.
#[derive(Debug)]
struct PipelineContext {
    root: PathBuf,
    settings: Settings,
    hub: ReloadHub,
    pipeline: StylePipeline,
}

/// Production executor for the built-in tasks.
pub struct PipelineExecutor {
    ctx: Arc<PipelineContext>,
    specs: HashMap<TaskName, TaskSpec>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    /// Keeps notify watchers alive for the session.
    watchers: Vec<WatcherHandle>,
}

impl PipelineExecutor {
    /// Build the executor, resolving the style pipeline once up front so a
    /// bad browser list fails at startup rather than on the first change.
    pub fn new(
        root: PathBuf,
        settings: Settings,
        specs: &[TaskSpec],
        hub: ReloadHub,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Result<Self> {
        let pipeline = StylePipeline::from_settings(&root, &settings.styles)?;

        let specs = specs
            .iter()
            .map(|s| (s.name.clone(), s.clone()))
            .collect();

        Ok(Self {
            ctx: Arc::new(PipelineContext {
                root,
                settings,
                hub,
                pipeline,
            }),
            specs,
            runtime_tx,
            watchers: Vec::new(),
        })
    }

    fn run_task(&mut self, task: ScheduledTask) -> Result<()> {
        let spec = self
            .specs
            .get(&task.name)
            .cloned()
            .ok_or_else(|| StylesyncError::TaskNotFound(task.name.clone()))?;

        info!(task = %task.name, run_id = task.run_id, "starting task");

        match spec.kind {
            TaskKind::CompileStyles => self.spawn_compile(task),
            TaskKind::DevServer => self.spawn_dev_server(task),
            TaskKind::WatchStyles => self.start_watcher(task, spec),
            TaskKind::Aggregate => {
                // Nothing to do; prerequisites carried all the work.
                self.send_completion(task.name, TaskOutcome::Success);
            }
        }

        Ok(())
    }

    /// Run one compile cycle off the async runtime.
    fn spawn_compile(&self, task: ScheduledTask) {
        let ctx = Arc::clone(&self.ctx);
        let tx = self.runtime_tx.clone();

        tokio::spawn(async move {
            let pipeline = ctx.pipeline.clone();
            let hub = ctx.hub.clone();
            let result =
                tokio::task::spawn_blocking(move || pipeline.run_cycle(&hub)).await;

            let outcome = match result {
                Ok(Ok(cycle)) => {
                    info!(task = %task.name, ?cycle, "compile cycle finished");
                    // A Sass error was already routed to the notifier; the
                    // task itself succeeded so the session continues.
                    TaskOutcome::Success
                }
                Ok(Err(err)) => {
                    error!(task = %task.name, error = %err, "compile cycle failed");
                    TaskOutcome::Failed
                }
                Err(err) => {
                    error!(task = %task.name, error = %err, "compile worker panicked");
                    TaskOutcome::Failed
                }
            };

            let _ = tx
                .send(RuntimeEvent::TaskCompleted {
                    task: task.name,
                    outcome,
                })
                .await;
        });
    }

    /// Bind and run the dev server; readiness is reported after the port is
    /// held, completion only if the server dies.
    fn spawn_dev_server(&self, task: ScheduledTask) {
        let ctx = Arc::clone(&self.ctx);
        let tx = self.runtime_tx.clone();

        tokio::spawn(async move {
            let settings = ctx.settings.serve.clone();

            let listener = match crate::serve::bind(&settings).await {
                Ok(listener) => listener,
                Err(err) => {
                    error!(task = %task.name, error = %err, "dev server failed to bind");
                    let _ = tx
                        .send(RuntimeEvent::TaskCompleted {
                            task: task.name,
                            outcome: TaskOutcome::Failed,
                        })
                        .await;
                    return;
                }
            };

            let _ = tx
                .send(RuntimeEvent::ServiceStarted {
                    task: task.name.clone(),
                })
                .await;

            let outcome = match crate::serve::run(listener, settings, ctx.hub.clone()).await {
                Ok(()) => {
                    warn!(task = %task.name, "dev server exited");
                    TaskOutcome::Success
                }
                Err(err) => {
                    error!(task = %task.name, error = %err, "dev server died");
                    TaskOutcome::Failed
                }
            };

            let _ = tx
                .send(RuntimeEvent::TaskCompleted {
                    task: task.name,
                    outcome,
                })
                .await;
        });
    }

    /// Start the filesystem watcher for this task's binding. Setup is
    /// synchronous, so readiness (or failure) is known immediately.
    fn start_watcher(&mut self, task: ScheduledTask, spec: TaskSpec) {
        let Some(binding) = spec.watch else {
            warn!(task = %task.name, "watch task has no binding; nothing to do");
            self.send_completion(task.name, TaskOutcome::Success);
            return;
        };

        let profile = match WatchProfile::compile(&binding) {
            Ok(profile) => profile,
            Err(err) => {
                error!(task = %task.name, error = %err, "invalid watch patterns");
                self.send_completion(task.name, TaskOutcome::Failed);
                return;
            }
        };

        match spawn_watcher(
            self.ctx.root.clone(),
            vec![profile],
            self.runtime_tx.clone(),
        ) {
            Ok(handle) => {
                self.watchers.push(handle);
                let tx = self.runtime_tx.clone();
                let name = task.name;
                tokio::spawn(async move {
                    let _ = tx.send(RuntimeEvent::ServiceStarted { task: name }).await;
                });
            }
            Err(err) => {
                error!(task = %task.name, error = %err, "failed to start file watcher");
                self.send_completion(task.name, TaskOutcome::Failed);
            }
        }
    }

    fn send_completion(&self, task: TaskName, outcome: TaskOutcome) {
        let tx = self.runtime_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(RuntimeEvent::TaskCompleted { task, outcome }).await;
        });
    }
}

impl TaskExecutor for PipelineExecutor {
    fn dispatch(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for task in tasks {
                self.run_task(task)?;
            }
            Ok(())
        })
    }
}
