// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stylesync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stylesync",
    version,
    about = "Compile, prefix and live-inject Sass stylesheets through a task DAG.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run: `compile-styles`, `dev-server`, `watch-styles` or `default`.
    ///
    /// `default` runs the dev server and the style watcher together.
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `stylesync.toml` in the current working directory is used
    /// when present, and the built-in defaults otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Print the task graph (names, prerequisites, watch bindings) and exit.
    #[arg(long)]
    pub list: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STYLESYNC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
