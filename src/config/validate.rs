// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::PipelineFile;
use crate::errors::{Result, StagerunError};

/// Run every semantic check on a deserialized pipeline file.
pub fn validate_config(cfg: &PipelineFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_run_section(cfg)?;
    validate_jobs(cfg)?;
    validate_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &PipelineFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(StagerunError::Config(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_run_section(cfg: &PipelineFile) -> Result<()> {
    if cfg.run.interval <= 0.0 {
        return Err(StagerunError::Config(format!(
            "[run].interval must be > 0 (got {})",
            cfg.run.interval
        )));
    }
    if let Some(timeout) = cfg.run.timeout {
        if timeout <= 0.0 {
            return Err(StagerunError::Config(format!(
                "[run].timeout must be > 0 (got {timeout})"
            )));
        }
    }
    Ok(())
}

fn validate_jobs(cfg: &PipelineFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        match (&job.cmd, &job.command) {
            (None, None) => {
                return Err(StagerunError::Config(format!(
                    "job '{name}' must set either `cmd` or `command`"
                )));
            }
            (Some(_), Some(_)) => {
                return Err(StagerunError::Config(format!(
                    "job '{name}' sets both `cmd` and `command`; pick one"
                )));
            }
            _ => {}
        }
        if let Some(command) = &job.command {
            if command.program.trim().is_empty() {
                return Err(StagerunError::Config(format!(
                    "job '{name}' has an empty `command.program`"
                )));
            }
        }
        if job.cores == 0 {
            return Err(StagerunError::Config(format!(
                "job '{name}' must request at least one core"
            )));
        }
        if job.nodes == 0 {
            return Err(StagerunError::Config(format!(
                "job '{name}' must request at least one node"
            )));
        }
        if job.cores < job.nodes {
            return Err(StagerunError::Config(format!(
                "job '{name}' requests {} cores across {} nodes; every node \
                 needs at least one core",
                job.cores, job.nodes
            )));
        }
        if let Some(mem) = job.mem_per_core {
            if mem <= 0.0 {
                return Err(StagerunError::Config(format!(
                    "job '{name}' has non-positive mem_per_core ({mem})"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dependencies(cfg: &PipelineFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            if !cfg.job.contains_key(dep) {
                return Err(StagerunError::Config(format!(
                    "job '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
            if dep == name {
                return Err(StagerunError::Config(format!(
                    "job '{name}' cannot depend on itself in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &PipelineFile) -> Result<()> {
    // Edge direction: dep -> job. For
    //   [job.b]
    //   after = ["a"]
    // we add edge a -> b.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.job.keys() {
        graph.add_node(name.as_str());
    }

    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort fails exactly when there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(StagerunError::GraphCycle(cycle.node_id().to_string())),
    }
}
