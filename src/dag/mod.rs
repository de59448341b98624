// src/dag/mod.rs

//! Dependency graph of jobs.

pub mod graph;

pub use graph::JobGraph;
