// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::cmdline::CommandSpec;

/// Top-level pipeline file.
///
/// ```toml
/// [run]
/// log_dir = "logs"
/// interval = 1.0
///
/// [site]
/// max_processes = 2
/// max_threads = 4
///
/// [job.prepare]
/// cmd = "python prepare.py"
///
/// [job.analyse]
/// cmd = "python analyse.py"
/// cores = 4
/// after = ["prepare"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub site: SiteSection,

    /// Jobs keyed by name. BTreeMap keeps iteration deterministic, which in
    /// turn makes the dispatch queue order deterministic.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// `[run]` section: how the run loop behaves.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Directory for per-job `{name}.out` log files.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Idle polling interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: f64,

    /// Wall-clock budget for the whole run, in seconds. No limit when unset.
    #[serde(default)]
    pub timeout: Option<f64>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            interval: default_interval(),
            timeout: None,
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_interval() -> f64 {
    3.0
}

/// `[site]` section: the shape of the machine(s) the run executes on.
///
/// Everything is optional; unset values are discovered from the environment
/// (SLURM allocation variables, or the local machine's parallelism).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Number of local worker nodes to model when not under SLURM.
    #[serde(default)]
    pub max_processes: Option<u32>,

    /// Cores per local node when not under SLURM.
    #[serde(default)]
    pub max_threads: Option<u32>,

    /// Cores per node, overriding whatever the batch environment reports.
    #[serde(default)]
    pub cores_per_node: Option<u32>,

    /// Memory per node in GB, used for memory-aware allocation.
    #[serde(default)]
    pub mem_per_node: Option<f64>,
}

/// One `[job.NAME]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Raw shell command line. Mutually exclusive with `command`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Structured command that is rendered to a shell line with quoting
    /// handled here instead of by the user. Mutually exclusive with `cmd`.
    #[serde(default)]
    pub command: Option<CommandSpec>,

    /// Total cores the job needs across all its nodes.
    #[serde(default = "default_one")]
    pub cores: u32,

    /// Minimum number of distinct nodes the allocation must span.
    #[serde(default = "default_one")]
    pub nodes: u32,

    /// Memory required per core in GB, capping how many cores a node with
    /// known memory can contribute.
    #[serde(default)]
    pub mem_per_core: Option<f64>,

    /// Names of jobs that must complete before this one starts.
    #[serde(default)]
    pub after: Vec<String>,
}

fn default_one() -> u32 {
    1
}

impl JobConfig {
    /// The shell command line to execute, rendering `command` when present.
    pub fn effective_cmd(&self) -> Option<String> {
        self.cmd
            .clone()
            .or_else(|| self.command.as_ref().map(CommandSpec::render))
    }
}
