// src/sched/job.rs

use std::fmt;

/// An immutable unit of work: a shell command plus its resource request.
///
/// The name doubles as the dependency-graph key and the log-file stem, so it
/// must be unique within a run. The runner tracks lifecycle status
/// externally; a `Job` itself never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    name: String,
    cmd: String,
    cores: u32,
    nodes: u32,
    mem_per_core: Option<f64>,
}

impl Job {
    /// Create a job needing 1 core on 1 node.
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            cores: 1,
            nodes: 1,
            mem_per_core: None,
        }
    }

    /// Total cores required (at least 1).
    pub fn with_cores(mut self, cores: u32) -> Self {
        self.cores = cores.max(1);
        self
    }

    /// Minimum number of distinct nodes the allocation must span (at least 1).
    pub fn with_nodes(mut self, nodes: u32) -> Self {
        self.nodes = nodes.max(1);
        self
    }

    /// Memory requirement in GB per core; limits how many cores a node with
    /// known memory can contribute.
    pub fn with_mem_per_core(mut self, gb: f64) -> Self {
        self.mem_per_core = Some(gb);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    pub fn nodes(&self) -> u32 {
        self.nodes
    }

    pub fn mem_per_core(&self) -> Option<f64> {
        self.mem_per_core
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Job {}>", self.name)
    }
}
