// src/sched/mod.rs

//! The local job scheduler core.
//!
//! A dependency-driven, resource-constrained polling scheduler: the runner
//! owns a pool of [`Node`]s and a [`crate::dag::JobGraph`], repeatedly polls
//! running subprocesses for completion, computes which queued jobs have all
//! prerequisites completed, allocates free nodes to them, and launches them.
//! Any single job failure aborts the entire run.
//!
//! - [`job`] / [`node`] hold the data types.
//! - [`alloc`] is the pure node-to-cores allocator.
//! - [`launch`] spawns and supervises subprocesses behind a trait seam.
//! - [`runner`] drives the loop and reports [`RunEvent`]s.

pub mod alloc;
pub mod job;
pub mod launch;
pub mod node;
pub mod runner;

pub use alloc::{allocate, Allocation};
pub use job::Job;
pub use launch::{JobHandle, Launcher, ProcessLauncher, Sleeper, TokioSleeper};
pub use node::{Node, NodePool};
pub use runner::{EventCallback, RunEvent, Runner};
