// src/errors.rs

//! Crate-wide error taxonomy and `Result` alias.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagerunError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("cycle detected in job graph involving '{0}'")]
    GraphCycle(String),

    #[error("malformed node list '{expr}': {reason}")]
    NodeList { expr: String, reason: String },

    /// A launched job exited nonzero. Fatal to the whole run.
    #[error("job '{job}' failed after {elapsed:.1?}")]
    FailedJob { job: String, elapsed: Duration },

    /// No job is running and no queued job can ever be scheduled.
    #[error("no job is running and none of the queued jobs can be scheduled")]
    CannotRun,

    #[error("run exceeded its wall-clock budget of {budget:?} (elapsed {elapsed:.1?})")]
    TimeOut { budget: Duration, elapsed: Duration },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StagerunError>;
