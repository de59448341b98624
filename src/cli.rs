// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stagerun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stagerun",
    version,
    about = "Run a pipeline of dependent jobs on local compute nodes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Stagerun.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Stagerun.toml")]
    pub config: String,

    /// Directory for per-job log files; overrides `[run].log_dir`.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<String>,

    /// Poll interval in seconds; overrides `[run].interval`.
    #[arg(long, value_name = "SECS")]
    pub interval: Option<f64>,

    /// Wall-clock budget in seconds; the run is aborted when exceeded.
    /// Overrides `[run].timeout`.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STAGERUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print jobs and dependencies, but don't execute.
    #[arg(long)]
    pub dry_run: bool,
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
