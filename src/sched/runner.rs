// src/sched/runner.rs

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::dag::JobGraph;
use crate::errors::{Result, StagerunError};
use crate::sched::alloc::{allocate, Allocation};
use crate::sched::launch::{JobHandle, Launcher, ProcessLauncher, Sleeper, TokioSleeper};
use crate::sched::node::{Node, NodePool};

/// Lifecycle events emitted while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A job's process was started on the listed nodes.
    Launched { job: String, nodes: Vec<String> },
    /// A job's process exited with code zero.
    Completed { job: String },
    /// A job's process exited nonzero; the run is about to abort.
    Failed { job: String, exit_code: i32 },
    /// Every running job was killed and all nodes were freed.
    Aborted,
}

/// Injected sink for [`RunEvent`]s, used by callers to trace execution.
pub type EventCallback = Box<dyn FnMut(&RunEvent) + Send>;

struct RunningJob {
    name: String,
    handle: Box<dyn JobHandle>,
    alloc: Allocation,
}

/// The polling scheduler.
///
/// Owns the node pool, the dependency graph, and the queued/running/completed
/// partition of the job universe. `run` drives the loop until every job
/// completes, one fails, or no progress can be made; any fatal condition
/// aborts the whole run (all children killed, all nodes freed) before the
/// error reaches the caller.
///
/// All state mutation happens synchronously inside one loop iteration;
/// parallelism exists only in the launched subprocesses, supervised by
/// non-blocking polls.
pub struct Runner<L: Launcher = ProcessLauncher, S: Sleeper = TokioSleeper> {
    pool: NodePool,
    graph: JobGraph,
    queued: Vec<String>,
    running: Vec<RunningJob>,
    completed: Vec<String>,
    log_dir: PathBuf,
    launcher: L,
    sleeper: S,
    callback: Option<EventCallback>,
    aborted: bool,
}

impl Runner {
    /// Create a runner with the production launcher and sleeper.
    ///
    /// No IO happens here; the log directory is created when `run` starts.
    pub fn new(nodes: Vec<Node>, graph: JobGraph, log_dir: impl Into<PathBuf>) -> Self {
        Self::with_parts(nodes, graph, log_dir, ProcessLauncher, TokioSleeper)
    }
}

impl<L: Launcher, S: Sleeper> Runner<L, S> {
    /// Create a runner with explicit launcher and sleeper implementations.
    pub fn with_parts(
        nodes: Vec<Node>,
        graph: JobGraph,
        log_dir: impl Into<PathBuf>,
        launcher: L,
        sleeper: S,
    ) -> Self {
        let queued = graph.names().map(str::to_string).collect();
        Self {
            pool: NodePool::new(nodes),
            graph,
            queued,
            running: Vec::new(),
            completed: Vec::new(),
            log_dir: log_dir.into(),
            launcher,
            sleeper,
            callback: None,
            aborted: false,
        }
    }

    /// Attach a lifecycle event callback.
    pub fn with_callback(mut self, callback: EventCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Jobs not yet launched, in dispatch order.
    pub fn queued(&self) -> &[String] {
        &self.queued
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Names of jobs that finished successfully, in completion order.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// Drive the pipeline to completion.
    ///
    /// Polls running jobs, launches newly-ready ones, and sleeps `interval`
    /// between iterations in which nothing changed. With a `timeout`, the
    /// cumulative wall clock is checked every iteration and the run aborts
    /// with [`StagerunError::TimeOut`] once the budget is exceeded.
    ///
    /// On any error every running process is killed and every node freed
    /// before the error is returned; no subprocess outlives the run.
    pub async fn run(&mut self, interval: Duration, timeout: Option<Duration>) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir)
            .with_context(|| format!("creating log directory {:?}", self.log_dir))?;

        let started = Instant::now();
        info!(
            jobs = self.graph.len(),
            nodes = self.pool.len(),
            log_dir = %self.log_dir.display(),
            "run started"
        );

        let result = self.run_loop(started, interval, timeout).await;
        if let Err(err) = &result {
            error!(error = %err, "run aborted");
            self.abort();
        }
        result
    }

    /// Kill every running job and release all node assignments.
    ///
    /// Called internally on any fatal condition; also usable externally for
    /// caller-initiated cancellation. Idempotent: repeated calls do nothing
    /// and emit no further events.
    pub fn abort(&mut self) {
        if self.aborted {
            return;
        }
        self.aborted = true;
        if !self.running.is_empty() {
            warn!(count = self.running.len(), "killing running jobs");
        }
        for rj in &mut self.running {
            rj.handle.kill();
        }
        self.running.clear();
        self.pool.free_all();
        self.emit(RunEvent::Aborted);
    }

    async fn run_loop(
        &mut self,
        started: Instant,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<()> {
        loop {
            let reaped = self.reap(started)?;

            if self.completed.len() == self.graph.len() {
                info!(elapsed = ?started.elapsed(), "all jobs completed");
                return Ok(());
            }

            if let Some(budget) = timeout {
                let elapsed = started.elapsed();
                if elapsed >= budget {
                    return Err(StagerunError::TimeOut { budget, elapsed });
                }
            }

            let ready = self.ready_jobs();
            if self.running.is_empty() && ready.is_empty() {
                // Remaining queued jobs can never be satisfied: either a
                // resource request exceeds anything the pool can offer, or a
                // malformed graph reached us.
                return Err(StagerunError::CannotRun);
            }

            let launched = self.dispatch(ready)?;

            if launched == 0 && self.running.is_empty() {
                // Every node is free, yet no ready job could be allocated.
                // Waiting cannot change that.
                return Err(StagerunError::CannotRun);
            }

            if reaped == 0 && launched == 0 {
                self.sleeper.sleep(interval).await;
            }
        }
    }

    /// Non-blocking sweep over running jobs.
    ///
    /// Successful exits free their nodes and move to `completed`. A nonzero
    /// exit fails the whole run. Returns how many jobs completed.
    fn reap(&mut self, started: Instant) -> Result<usize> {
        let mut exited = Vec::new();
        for (i, rj) in self.running.iter_mut().enumerate() {
            if let Some(code) = rj.handle.poll()? {
                exited.push((i, code));
            }
        }

        if let Some((i, code)) = exited.iter().find(|(_, code)| *code != 0).copied() {
            let job = self.running[i].name.clone();
            error!(job = %job, exit_code = code, "job failed");
            self.emit(RunEvent::Failed {
                job: job.clone(),
                exit_code: code,
            });
            return Err(StagerunError::FailedJob {
                job,
                elapsed: started.elapsed(),
            });
        }

        let count = exited.len();
        // Remove back-to-front so earlier indices stay valid.
        for (i, _) in exited.into_iter().rev() {
            let rj = self.running.remove(i);
            self.pool.release(&rj.alloc);
            info!(job = %rj.name, "job completed");
            self.emit(RunEvent::Completed {
                job: rj.name.clone(),
            });
            self.completed.push(rj.name);
        }
        Ok(count)
    }

    /// Queued jobs whose prerequisites have all completed, in queue order.
    fn ready_jobs(&self) -> Vec<String> {
        let done: HashSet<&str> = self.completed.iter().map(String::as_str).collect();
        self.queued
            .iter()
            .filter(|name| {
                self.graph
                    .dependencies_of(name)
                    .iter()
                    .all(|dep| done.contains(dep.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Try to launch each ready job in order.
    ///
    /// A job that cannot be allocated right now stays queued and the next
    /// ready job is tried; smaller jobs are not starved behind an infeasible
    /// large one. Returns how many jobs launched.
    fn dispatch(&mut self, ready: Vec<String>) -> Result<usize> {
        let mut launched = 0;
        for name in ready {
            let Some(job) = self.graph.job(&name) else {
                continue;
            };
            let free = self.pool.free_nodes();
            let Some(alloc) = allocate(&free, job) else {
                debug!(job = %name, "no allocation available; job stays queued");
                continue;
            };

            let log_path = self.log_dir.join(format!("{name}.out"));
            let handle = self.launcher.launch(job, &log_path)?;

            let nodes = alloc.node_names();
            self.pool.apply(&alloc);
            self.queued.retain(|q| q != &name);
            info!(job = %name, nodes = ?nodes, log = %log_path.display(), "job launched");
            self.running.push(RunningJob {
                name: name.clone(),
                handle,
                alloc,
            });
            self.emit(RunEvent::Launched { job: name, nodes });
            launched += 1;
        }
        Ok(launched)
    }

    fn emit(&mut self, event: RunEvent) {
        if let Some(cb) = self.callback.as_mut() {
            cb(&event);
        }
    }
}
