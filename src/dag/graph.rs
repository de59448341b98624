// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::PipelineFile;
use crate::errors::{Result, StagerunError};
use crate::sched::job::Job;

/// The immutable universe of jobs for one run, plus their dependencies.
///
/// Jobs keep their insertion order, which is the order the scheduler uses to
/// seed its queue. Dependencies are stored by name; construction guarantees
/// every referenced name exists and the graph is acyclic.
#[derive(Debug, Clone, Default)]
pub struct JobGraph {
    jobs: Vec<Job>,
    index: HashMap<String, usize>,
    deps: HashMap<String, Vec<String>>,
}

impl JobGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job with its prerequisite names. Names must be unique.
    pub fn add_job(&mut self, job: Job, after: Vec<String>) -> Result<()> {
        let name = job.name().to_string();
        if self.index.contains_key(&name) {
            return Err(StagerunError::Config(format!(
                "duplicate job name '{name}'"
            )));
        }
        self.index.insert(name.clone(), self.jobs.len());
        self.deps.insert(name, after);
        self.jobs.push(job);
        Ok(())
    }

    /// Build the graph from a validated pipeline file.
    ///
    /// Runs its own cycle check so the invariant holds even for callers that
    /// assemble a `PipelineFile` without going through the loader.
    pub fn from_config(cfg: &PipelineFile) -> Result<Self> {
        let mut graph = Self::new();
        for (name, jc) in cfg.job.iter() {
            let cmd = jc.effective_cmd().ok_or_else(|| {
                StagerunError::Config(format!("job '{name}' has no command"))
            })?;
            let mut job = Job::new(name, cmd)
                .with_cores(jc.cores)
                .with_nodes(jc.nodes);
            if let Some(mem) = jc.mem_per_core {
                job = job.with_mem_per_core(mem);
            }
            graph.add_job(job, jc.after.clone())?;
        }
        graph.ensure_acyclic()?;
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Job names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(Job::name)
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.index.get(name).map(|&i| &self.jobs[i])
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Prerequisite names of a job. Unknown names have no prerequisites.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.deps.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Verify every dependency exists and the graph has no cycle.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for job in &self.jobs {
            graph.add_node(job.name());
        }
        for (name, deps) in self.deps.iter() {
            for dep in deps {
                if !self.index.contains_key(dep) {
                    return Err(StagerunError::Config(format!(
                        "job '{name}' depends on unknown job '{dep}'"
                    )));
                }
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }
        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(StagerunError::GraphCycle(cycle.node_id().to_string())),
        }
    }
}
