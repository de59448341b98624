// src/lib.rs

pub mod cli;
pub mod cmdline;
pub mod config;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod sched;
pub mod site;

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::PipelineFile;
use crate::dag::JobGraph;
use crate::errors::{Result, StagerunError};
use crate::sched::Runner;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - node discovery (SLURM allocation or local machine)
/// - job graph construction
/// - the polling runner
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let graph = JobGraph::from_config(&cfg)?;
    let nodes = site::discover_nodes(&cfg.site)?;

    // CLI flags override the [run] section.
    let log_dir = args.log_dir.unwrap_or_else(|| cfg.run.log_dir.clone());
    let interval = Duration::from_secs_f64(args.interval.unwrap_or(cfg.run.interval));
    let timeout = args
        .timeout
        .or(cfg.run.timeout)
        .map(Duration::from_secs_f64);

    info!(
        config = %config_path.display(),
        jobs = graph.len(),
        nodes = nodes.len(),
        "starting pipeline"
    );

    let mut runner = Runner::new(nodes, graph, log_dir.clone());
    match runner.run(interval, timeout).await {
        Ok(()) => Ok(()),
        Err(err) => {
            if let StagerunError::FailedJob { job, .. } = &err {
                error!(
                    job = %job,
                    log = %format!("{log_dir}/{job}.out"),
                    "pipeline failed; see the job's log for details"
                );
            }
            Err(err)
        }
    }
}

/// Simple dry-run output: print jobs, resources and dependencies.
fn print_dry_run(cfg: &PipelineFile) {
    println!("stagerun dry-run");
    println!("  run.log_dir = {}", cfg.run.log_dir);
    println!("  run.interval = {}", cfg.run.interval);
    if let Some(timeout) = cfg.run.timeout {
        println!("  run.timeout = {timeout}");
    }
    println!();

    println!("jobs ({}):", cfg.job.len());
    for (name, job) in cfg.job.iter() {
        println!("  - {name}");
        if let Some(cmd) = job.effective_cmd() {
            println!("      cmd: {cmd}");
        }
        println!("      cores: {}", job.cores);
        if job.nodes > 1 {
            println!("      nodes: {}", job.nodes);
        }
        if let Some(mem) = job.mem_per_core {
            println!("      mem_per_core: {mem}");
        }
        if !job.after.is_empty() {
            println!("      after: {:?}", job.after);
        }
    }
}
