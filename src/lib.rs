// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod reload;
pub mod serve;
pub mod styles;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_from_path, load_or_default, Settings};
use crate::dag::registry::builtin_tasks;
use crate::dag::{DagGraph, Scheduler, TaskSpec};
use crate::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
};
use crate::errors::StylesyncError;
use crate::exec::PipelineExecutor;
use crate::reload::ReloadHub;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the built-in task registry and its validation
/// - scheduler / runtime / executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(&args)?;

    let specs = builtin_tasks(&settings);
    dag::graph::validate_specs(&specs)?;

    if args.list {
        print_task_list(&specs);
        return Ok(());
    }

    let graph = DagGraph::from_specs(&specs);
    if !graph.contains(&args.task) {
        return Err(StylesyncError::TaskNotFound(args.task.clone()).into());
    }

    let root = std::env::current_dir()?;
    let hub = ReloadHub::new();

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = PipelineExecutor::new(
        root,
        settings,
        &specs,
        hub,
        rt_tx.clone(),
    )?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Seed the initial trigger from the CLI.
    info!(task = %args.task, "triggering requested task");
    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: args.task.clone(),
            reason: TriggerReason::Cli,
        })
        .await?;

    // One-off runs exit on their own; anything that starts a service runs
    // until Ctrl-C.
    let has_service = graph
        .requirement_closure(&args.task)
        .iter()
        .any(|name| {
            specs
                .iter()
                .any(|s| &s.name == name && s.kind.is_service())
        });
    let options = RuntimeOptions {
        exit_when_idle: !has_service,
    };

    let scheduler = Scheduler::from_specs(&specs);
    let core = CoreRuntime::new(scheduler, options);

    let runtime = Runtime::new(core, rt_rx, executor);
    runtime.run().await?;
    Ok(())
}

fn load_settings(args: &CliArgs) -> errors::Result<Settings> {
    match &args.config {
        // An explicit path must exist; a typo should not silently fall back
        // to defaults.
        Some(path) => load_from_path(PathBuf::from(path)),
        None => load_or_default(default_config_path()),
    }
}

/// `--list` output: tasks, prerequisites and watch bindings.
fn print_task_list(specs: &[TaskSpec]) {
    println!("stylesync tasks ({}):", specs.len());
    for spec in specs {
        println!("  - {}", spec.name);
        if !spec.after.is_empty() {
            println!("      after: {:?}", spec.after);
        }
        if let Some(ref binding) = spec.watch {
            println!(
                "      watch: {:?} -> {}",
                binding.patterns, binding.triggers
            );
        }
        if spec.kind.is_service() {
            println!("      long-lived: true");
        }
    }
}
