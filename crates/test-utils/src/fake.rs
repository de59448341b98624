//! Fake launcher and sleeper for deterministic scheduler tests.
//!
//! No processes are spawned: each "job" counts down a configured number of
//! polls and then reports a configured exit code. Launches and kills are
//! recorded so tests can assert on them.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stagerun::errors::Result;
use stagerun::sched::{Job, JobHandle, Launcher, Sleeper};

/// How a fake job's process should behave.
#[derive(Debug, Clone, Copy)]
pub struct FakeOutcome {
    /// Number of polls that report "still running" before the exit code
    /// appears. 0 means the very first poll sees the exit.
    pub polls_until_exit: u32,
    pub exit_code: i32,
}

impl FakeOutcome {
    pub fn success_after(polls: u32) -> Self {
        Self {
            polls_until_exit: polls,
            exit_code: 0,
        }
    }

    pub fn failure_after(polls: u32, exit_code: i32) -> Self {
        Self {
            polls_until_exit: polls,
            exit_code,
        }
    }
}

/// Shared record of everything the fake launcher observed.
#[derive(Debug, Default)]
pub struct FakeLog {
    /// (job name, log file path) per launch, in launch order.
    pub launched: Vec<(String, String)>,
    /// Job names whose handles were killed.
    pub killed: Vec<String>,
}

/// A [`Launcher`] that fabricates process lifecycles per job name.
///
/// Jobs without a configured outcome succeed after one poll.
pub struct FakeLauncher {
    outcomes: HashMap<String, FakeOutcome>,
    log: Arc<Mutex<FakeLog>>,
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            log: Arc::new(Mutex::new(FakeLog::default())),
        }
    }

    pub fn with_outcome(mut self, job: impl Into<String>, outcome: FakeOutcome) -> Self {
        self.outcomes.insert(job.into(), outcome);
        self
    }

    /// Handle to the shared launch/kill record for later assertions.
    pub fn log_handle(&self) -> Arc<Mutex<FakeLog>> {
        Arc::clone(&self.log)
    }
}

impl Launcher for FakeLauncher {
    fn launch(&mut self, job: &Job, log_path: &Path) -> Result<Box<dyn JobHandle>> {
        let outcome = self
            .outcomes
            .get(job.name())
            .copied()
            .unwrap_or_else(|| FakeOutcome::success_after(1));
        self.log
            .lock()
            .unwrap()
            .launched
            .push((job.name().to_string(), log_path.display().to_string()));
        Ok(Box::new(FakeHandle {
            name: job.name().to_string(),
            remaining: outcome.polls_until_exit,
            exit_code: outcome.exit_code,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeHandle {
    name: String,
    remaining: u32,
    exit_code: i32,
    log: Arc<Mutex<FakeLog>>,
}

impl JobHandle for FakeHandle {
    fn poll(&mut self) -> Result<Option<i32>> {
        if self.remaining == 0 {
            Ok(Some(self.exit_code))
        } else {
            self.remaining -= 1;
            Ok(None)
        }
    }

    fn kill(&mut self) {
        self.log.lock().unwrap().killed.push(self.name.clone());
    }
}

/// A [`Sleeper`] that records requested durations and yields instead of
/// sleeping, so tests run at full speed while still observing idle
/// iterations.
#[derive(Default)]
pub struct ManualSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl ManualSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept_handle(&self) -> Arc<Mutex<Vec<Duration>>> {
        Arc::clone(&self.slept)
    }
}

impl Sleeper for ManualSleeper {
    fn sleep(&mut self, interval: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.slept.lock().unwrap().push(interval);
        Box::pin(tokio::task::yield_now())
    }
}
