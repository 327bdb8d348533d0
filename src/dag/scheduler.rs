// src/dag/scheduler.rs

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::registry::TaskSpec;
use crate::engine::{TaskName, TaskOutcome};

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Task is part of this run but waiting on prerequisites.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    /// Task completed successfully for this run (a started service counts as
    /// completed the moment the run reaches it).
    DoneSuccess,
    /// Task failed in this run (or was blocked by a failed prerequisite).
    DoneFailed,
}

impl RunState {
    fn is_terminal(self) -> bool {
        matches!(self, RunState::DoneSuccess | RunState::DoneFailed)
    }
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not participating in the current run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// Description of a task the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    /// Monotonically increasing run identifier; all tasks belonging to the
    /// same run share it.
    pub run_id: u64,
}

/// Outcome of feeding one event into the scheduler.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready and should be dispatched.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that entered `DoneFailed` as a result of this event.
    pub newly_failed: Vec<TaskName>,
    /// Whether this event finished the active run.
    pub run_just_finished: bool,
}

#[derive(Debug)]
struct TaskEntry {
    name: TaskName,
    service: bool,
    deps: Vec<TaskName>,
    run_state: Option<RunState>,
}

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - deciding when a triggered task is ready to run (prerequisites done)
/// - satisfying prerequisites on already-started services without
///   re-dispatching them
/// - marking tasks as succeeded/failed and failing dependents on failure
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskEntry>,
    /// Registration order, for deterministic ready-set dispatch.
    order: Vec<TaskName>,
    /// Services that reported readiness and are still running.
    services_started: HashSet<TaskName>,
    run_counter: u64,
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Construct a scheduler from validated task specs.
    pub fn from_specs(specs: &[TaskSpec]) -> Self {
        let graph = DagGraph::from_specs(specs);
        let mut tasks = HashMap::new();
        let mut order = Vec::with_capacity(specs.len());

        for spec in specs {
            order.push(spec.name.clone());
            tasks.insert(
                spec.name.clone(),
                TaskEntry {
                    name: spec.name.clone(),
                    service: spec.kind.is_service(),
                    deps: spec.after.clone(),
                    run_state: None,
                },
            );
        }

        Self {
            graph,
            tasks,
            order,
            services_started: HashSet::new(),
            run_counter: 0,
            current_run_id: None,
        }
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state; `None` for unknown tasks.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let entry = self.tasks.get(task)?;
        Some(entry.run_state.into())
    }

    /// Whether `task` is a long-lived service.
    pub fn is_service(&self, task: &str) -> bool {
        self.tasks.get(task).is_some_and(|e| e.service)
    }

    /// Whether a service already reported readiness this session.
    pub fn service_is_started(&self, task: &str) -> bool {
        self.services_started.contains(task)
    }

    /// Start a new run, resetting per-run state. Started services survive
    /// across runs.
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for entry in self.tasks.values_mut() {
            entry.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new run");
    }

    /// Handle a trigger for a task: pull the task and its transitive
    /// prerequisites into the run and dispatch whatever became ready.
    pub fn step_trigger(&mut self, task: &str) -> SchedulerStep {
        if self.current_run_id.is_none() {
            warn!(
                task = %task,
                "trigger with no active run; implicitly starting a new run"
            );
            self.start_new_run();
        }

        if self.tasks.contains_key(task) {
            for name in self.graph.requirement_closure(task) {
                let entry = self.tasks.get_mut(&name).expect("closure of known task");
                if entry.run_state.is_none() {
                    entry.run_state = Some(RunState::Pending);
                }
            }
        } else {
            warn!(task = %task, "trigger for unknown task; ignoring");
        }

        self.finish_step(Vec::new())
    }

    /// Handle readiness of a long-lived service.
    pub fn step_service_started(&mut self, task: &str) -> SchedulerStep {
        match self.tasks.get_mut(task) {
            Some(entry) if entry.service => {
                debug!(task = %entry.name, "service reported readiness");
                entry.run_state = Some(RunState::DoneSuccess);
                self.services_started.insert(task.to_string());
            }
            Some(_) => {
                warn!(task = %task, "readiness report from non-service task; ignoring");
                return SchedulerStep::default();
            }
            None => {
                warn!(task = %task, "readiness report from unknown task; ignoring");
                return SchedulerStep::default();
            }
        }

        self.finish_step(Vec::new())
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        // A completing service has exited, whatever the outcome or run state.
        if self.tasks.get(task).is_some_and(|e| e.service) {
            self.services_started.remove(task);
        }

        let run_id = match self.current_run_id {
            Some(id) => id,
            None => {
                warn!(task = %task, "completion with no active run; ignoring");
                return SchedulerStep::default();
            }
        };

        let mut newly_failed = Vec::new();
        let mut failed_here = false;

        match self.tasks.get_mut(task) {
            Some(entry) => match outcome {
                TaskOutcome::Success => {
                    entry.run_state = Some(RunState::DoneSuccess);
                    debug!(task = %entry.name, run_id, "task completed successfully");
                }
                TaskOutcome::Failed => {
                    entry.run_state = Some(RunState::DoneFailed);
                    warn!(
                        task = %entry.name,
                        run_id,
                        "task failed; failing dependents in this run"
                    );
                    newly_failed.push(entry.name.clone());
                    failed_here = true;
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        if failed_here {
            let mut blocked = self.fail_dependents(task);
            newly_failed.append(&mut blocked);
        }

        self.finish_step(newly_failed)
    }

    /// Mark every pending transitive dependent of `task` as failed.
    fn fail_dependents(&mut self, task: &str) -> Vec<TaskName> {
        let mut failed = Vec::new();
        let mut stack: Vec<TaskName> = self.graph.dependents_of(task).to_vec();

        while let Some(name) = stack.pop() {
            if let Some(entry) = self.tasks.get_mut(&name) {
                if entry.run_state == Some(RunState::Pending) {
                    entry.run_state = Some(RunState::DoneFailed);
                    failed.push(name.clone());
                    stack.extend(self.graph.dependents_of(&name).iter().cloned());
                }
            }
        }

        failed
    }

    /// Collect ready tasks, cascade started-service satisfaction, and close
    /// the run if everything is terminal.
    fn finish_step(&mut self, newly_failed: Vec<TaskName>) -> SchedulerStep {
        let newly_scheduled = self.collect_ready();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }

    /// Pending tasks whose prerequisites are all done become `Running` and
    /// are handed to the executor. Services that already started this session
    /// are satisfied in place, which may unblock further tasks, hence the
    /// fixpoint loop.
    fn collect_ready(&mut self) -> Vec<ScheduledTask> {
        let run_id = match self.current_run_id {
            Some(id) => id,
            None => return Vec::new(),
        };

        let mut scheduled = Vec::new();
        loop {
            let mut satisfied_a_service = false;

            let ready: Vec<TaskName> = self
                .order
                .iter()
                .filter(|name| {
                    let entry = &self.tasks[name.as_str()];
                    entry.run_state == Some(RunState::Pending) && self.deps_done(&entry.deps)
                })
                .cloned()
                .collect();

            for name in ready {
                let already_started = self.services_started.contains(&name);
                let entry = self.tasks.get_mut(&name).expect("ready task exists");

                if entry.service && already_started {
                    entry.run_state = Some(RunState::DoneSuccess);
                    satisfied_a_service = true;
                } else {
                    entry.run_state = Some(RunState::Running);
                    scheduled.push(ScheduledTask {
                        name: name.clone(),
                        run_id,
                    });
                }
            }

            if !satisfied_a_service {
                break;
            }
        }

        scheduled
    }

    fn deps_done(&self, deps: &[TaskName]) -> bool {
        deps.iter()
            .all(|d| matches!(self.tasks.get(d.as_str()).and_then(|e| e.run_state), Some(RunState::DoneSuccess)))
    }

    /// Clear `current_run_id` once every participating task is terminal.
    ///
    /// Returns `true` if this call transitioned the scheduler to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        // Vacuously true for a run that marked nothing (e.g. a trigger for
        // an unknown task), which correctly closes it right away.
        let all_terminal = self
            .tasks
            .values()
            .filter_map(|e| e.run_state)
            .all(RunState::is_terminal);

        if all_terminal {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; run finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dag::registry::{builtin_tasks, COMPILE_STYLES, DEFAULT, DEV_SERVER, WATCH_STYLES};

    fn scheduler() -> Scheduler {
        Scheduler::from_specs(&builtin_tasks(&Settings::default()))
    }

    fn names(tasks: &[ScheduledTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn default_run_dispatches_unblocked_tasks_in_registration_order() {
        let mut s = scheduler();
        s.start_new_run();

        // The watcher has no prerequisite, so it starts alongside the
        // compile cycle; only the dev server waits.
        let step = s.step_trigger(DEFAULT);
        assert_eq!(names(&step.newly_scheduled), vec![COMPILE_STYLES, WATCH_STYLES]);
        assert!(!step.run_just_finished);
    }

    #[test]
    fn dev_server_dispatches_after_compile() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger(DEFAULT);

        let step = s.step_completion(COMPILE_STYLES, TaskOutcome::Success);
        assert_eq!(names(&step.newly_scheduled), vec![DEV_SERVER]);
    }

    #[test]
    fn run_finishes_once_services_are_up_and_aggregate_completes() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger(DEFAULT);
        s.step_completion(COMPILE_STYLES, TaskOutcome::Success);

        s.step_service_started(WATCH_STYLES);
        let step = s.step_service_started(DEV_SERVER);
        assert_eq!(names(&step.newly_scheduled), vec![DEFAULT]);

        let step = s.step_completion(DEFAULT, TaskOutcome::Success);
        assert!(step.run_just_finished);
        assert!(s.is_idle());
    }

    #[test]
    fn started_service_satisfies_later_runs_without_redispatch() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger(DEV_SERVER);
        s.step_completion(COMPILE_STYLES, TaskOutcome::Success);
        s.step_service_started(DEV_SERVER);
        assert!(s.is_idle());

        // Second run targeting the already-running server: only the compile
        // cycle is dispatched.
        s.start_new_run();
        let step = s.step_trigger(DEV_SERVER);
        assert_eq!(names(&step.newly_scheduled), vec![COMPILE_STYLES]);

        let step = s.step_completion(COMPILE_STYLES, TaskOutcome::Success);
        assert!(step.newly_scheduled.is_empty());
        assert!(step.run_just_finished);
    }

    #[test]
    fn failed_compile_blocks_dependents() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger(DEFAULT);

        let step = s.step_completion(COMPILE_STYLES, TaskOutcome::Failed);
        assert!(step.newly_failed.contains(&COMPILE_STYLES.to_string()));
        assert!(step.newly_failed.contains(&DEV_SERVER.to_string()));
        assert!(step.newly_failed.contains(&DEFAULT.to_string()));
        // watch-styles was already dispatched at trigger time and is
        // unaffected by the compile failure.
        assert!(step.newly_scheduled.is_empty());
        assert_eq!(s.run_state_of(WATCH_STYLES), Some(TaskRunState::Running));
    }

    #[test]
    fn service_exit_clears_started_state_even_when_idle() {
        let mut s = scheduler();
        s.start_new_run();
        s.step_trigger(WATCH_STYLES);
        s.step_service_started(WATCH_STYLES);
        assert!(s.service_is_started(WATCH_STYLES));
        assert!(s.is_idle());

        // The service dies while no run is active.
        s.step_completion(WATCH_STYLES, TaskOutcome::Failed);
        assert!(!s.service_is_started(WATCH_STYLES));
    }
}
