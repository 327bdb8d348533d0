// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`RuntimeEvent`]s and produces a list of commands describing what the IO
//! shell should do next. The async shell (`engine::runtime::Runtime`) is
//! responsible for reading events from channels and handing scheduled tasks
//! to the executor.
//!
//! The core has no channels, no Tokio types, and performs no IO, so it can
//! be driven directly in tests.

use tracing::{debug, warn};

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName, TaskOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the runtime loop exits.
    RequestExit,
}

/// Decision returned by the core after handling a single [`RuntimeEvent`].
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Pure core runtime state: the scheduler, the trigger queue and options.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    /// Tasks that failed at any point in the session.
    failed: Vec<TaskName>,
    /// Set once a shutdown event has been consumed.
    shutdown_requested: bool,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        Self {
            scheduler,
            queue: TriggerQueue::new(),
            options,
            failed: Vec::new(),
            shutdown_requested: false,
        }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Tasks that failed during the session.
    pub fn failed_tasks(&self) -> &[TaskName] {
        &self.failed
    }

    /// Whether the loop ended because the operator asked it to.
    pub fn shutdown_was_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                debug!(task = %task, ?reason, "core: trigger");
                self.handle_trigger(task)
            }
            RuntimeEvent::ServiceStarted { task } => {
                let step = self.scheduler.step_service_started(&task);
                self.after_scheduler_step(step, true)
            }
            RuntimeEvent::TaskCompleted { task, outcome } => {
                let fatal =
                    self.scheduler.is_service(&task) && outcome == TaskOutcome::Failed;
                let step = self.scheduler.step_completion(&task, outcome);
                if outcome == TaskOutcome::Failed {
                    self.failed.push(task.clone());
                }
                if fatal {
                    warn!(task = %task, "service died; ending session");
                    let mut core_step = self.after_scheduler_step(step, false);
                    core_step.commands.push(CoreCommand::RequestExit);
                    core_step.keep_running = false;
                    return core_step;
                }
                self.after_scheduler_step(step, true)
            }
            RuntimeEvent::ShutdownRequested => {
                self.shutdown_requested = true;
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }

    /// Trigger handling:
    /// - scheduler idle: start a fresh run seeded with this trigger
    /// - task already participating in the active run: queue the trigger for
    ///   a later run (one recompilation per change event)
    /// - task not in the active run: merge it into the run immediately
    fn handle_trigger(&mut self, task: TaskName) -> CoreStep {
        if self.scheduler.is_idle() {
            self.scheduler.start_new_run();
            let step = self.scheduler.step_trigger(&task);
            return self.after_scheduler_step(step, true);
        }

        match self.scheduler.run_state_of(&task) {
            None => {
                warn!(task = %task, "trigger for unknown task; ignoring");
                CoreStep::running(Vec::new())
            }
            Some(TaskRunState::NotInRun) => {
                let step = self.scheduler.step_trigger(&task);
                self.after_scheduler_step(step, true)
            }
            Some(_already_in_run) => {
                self.queue.record_trigger(&task);
                CoreStep::running(Vec::new())
            }
        }
    }

    /// Shared post-processing for scheduler steps: dispatch newly ready
    /// tasks, replay one queued trigger once idle, and decide whether the
    /// loop may exit.
    fn after_scheduler_step(&mut self, step: SchedulerStep, allow_exit: bool) -> CoreStep {
        let mut commands = Vec::new();

        if !step.newly_scheduled.is_empty() {
            commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
        }

        // A replayed trigger may be satisfied in place (started service) and
        // finish its run immediately, so keep draining until a run sticks.
        while self.scheduler.is_idle() {
            let Some(task) = self.queue.pop_next() else { break };
            debug!(task = %task, remaining = self.queue.len(), "replaying queued trigger");
            self.scheduler.start_new_run();
            let replay = self.scheduler.step_trigger(&task);
            if !replay.newly_scheduled.is_empty() {
                commands.push(CoreCommand::DispatchTasks(replay.newly_scheduled));
            }
        }

        if allow_exit
            && self.options.exit_when_idle
            && self.scheduler.is_idle()
            && self.queue.is_empty()
        {
            commands.push(CoreCommand::RequestExit);
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        CoreStep::running(commands)
    }
}
