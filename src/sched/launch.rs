// src/sched/launch.rs

//! Process launching and supervision primitives.
//!
//! The runner talks to a [`Launcher`] instead of `tokio::process` directly.
//! This makes it easy to swap in a fake launcher in tests while keeping the
//! production implementation here.

use std::fs::File;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::sched::job::Job;

/// Supervision handle for one launched job process.
pub trait JobHandle: Send {
    /// Non-blocking exit check: `None` while the process is still running,
    /// the exit code once it has finished. Must never block the loop.
    fn poll(&mut self) -> Result<Option<i32>>;

    /// Forcefully terminate the process. Safe to call repeatedly and after
    /// exit.
    fn kill(&mut self);
}

/// How jobs get launched.
///
/// Production code uses [`ProcessLauncher`]; tests can provide their own
/// implementation that fakes process lifecycles without spawning anything.
pub trait Launcher: Send {
    /// Start the job's command with output redirected to `log_path`.
    fn launch(&mut self, job: &Job, log_path: &Path) -> Result<Box<dyn JobHandle>>;
}

/// Injected suspension point for the polling loop.
pub trait Sleeper: Send {
    fn sleep(&mut self, interval: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Default sleeper backed by the Tokio timer.
#[derive(Debug, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&mut self, interval: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(interval))
    }
}

/// Launcher that spawns real OS processes with stdout and stderr merged into
/// one per-job log file.
#[derive(Debug, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&mut self, job: &Job, log_path: &Path) -> Result<Box<dyn JobHandle>> {
        let stdout = File::create(log_path)
            .with_context(|| format!("creating log file {:?} for job '{}'", log_path, job.name()))?;
        let stderr = stdout
            .try_clone()
            .with_context(|| format!("duplicating log handle for job '{}'", job.name()))?;

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = tokio::process::Command::new("cmd");
            c.arg("/C").arg(job.cmd());
            c
        } else {
            let mut c = tokio::process::Command::new("sh");
            c.arg("-c").arg(job.cmd());
            c
        };

        cmd.stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning process for job '{}'", job.name()))?;

        debug!(job = %job.name(), log = %log_path.display(), "process spawned");
        Ok(Box::new(ChildHandle { child }))
    }
}

struct ChildHandle {
    child: tokio::process::Child,
}

impl JobHandle for ChildHandle {
    fn poll(&mut self) -> Result<Option<i32>> {
        match self.child.try_wait()? {
            // Death by signal carries no code; report it as a generic failure.
            Some(status) => Ok(Some(status.code().unwrap_or(-1))),
            None => Ok(None),
        }
    }

    fn kill(&mut self) {
        // start_kill is non-blocking; kill_on_drop backstops the rest.
        let _ = self.child.start_kill();
    }
}
