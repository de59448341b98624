// src/site/mod.rs

//! Node discovery: turn the execution environment into a list of
//! [`Node`]s for the scheduler.
//!
//! Inside a SLURM allocation the node list and core counts come from the
//! `SLURM_*` environment; anywhere else the local machine is modelled as a
//! handful of virtual nodes.

use std::env;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::model::SiteSection;
use crate::errors::{Result, StagerunError};
use crate::sched::node::Node;

const DEFAULT_SLURM_CORES: u32 = 32;

/// Discover the nodes available to this run.
pub fn discover_nodes(site: &SiteSection) -> Result<Vec<Node>> {
    if env::var("SLURM_JOB_ID").is_ok() {
        discover_slurm_nodes(site)
    } else {
        Ok(discover_local_nodes(site))
    }
}

fn discover_slurm_nodes(site: &SiteSection) -> Result<Vec<Node>> {
    let expr = env::var("SLURM_JOB_NODELIST").map_err(|_| {
        StagerunError::Config(
            "SLURM_JOB_ID is set but SLURM_JOB_NODELIST is missing".to_string(),
        )
    })?;
    let names = expand_node_list(&expr)?;

    let cores = match site.cores_per_node {
        Some(cores) => cores,
        None => match env::var("SLURM_CPUS_ON_NODE") {
            Ok(s) => s.trim().parse().unwrap_or_else(|_| {
                warn!(value = %s, "unparseable SLURM_CPUS_ON_NODE; assuming {DEFAULT_SLURM_CORES}");
                DEFAULT_SLURM_CORES
            }),
            Err(_) => {
                warn!("SLURM_CPUS_ON_NODE not set; assuming {DEFAULT_SLURM_CORES} cores per node");
                DEFAULT_SLURM_CORES
            }
        },
    };

    debug!(nodes = names.len(), cores, "discovered SLURM allocation");
    Ok(names
        .into_iter()
        .map(|name| {
            let node = Node::new(name, cores);
            match site.mem_per_node {
                Some(mem) => node.with_mem(mem),
                None => node,
            }
        })
        .collect())
}

/// Model the local machine as `max_processes` nodes of `max_threads` cores.
///
/// With neither set this is one node using all available parallelism.
fn discover_local_nodes(site: &SiteSection) -> Vec<Node> {
    let procs = site.max_processes.unwrap_or(1).max(1);
    let cores = match site.max_threads {
        Some(threads) => threads.max(1),
        None => {
            let total = std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(1);
            (total / procs).max(1)
        }
    };
    let host = env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());

    debug!(nodes = procs, cores, "modelling local machine");
    (0..procs)
        .map(|i| {
            let node = Node::new(format!("{host}_{i}"), cores);
            match site.mem_per_node {
                Some(mem) => node.with_mem(mem),
                None => node,
            }
        })
        .collect()
}

/// Expand a SLURM compact node list like `hostA[01-03,05]` into individual
/// host names, preserving zero padding. A plain name without brackets passes
/// through as a single-element list.
pub fn expand_node_list(expr: &str) -> Result<Vec<String>> {
    let expr = expr.trim();
    let Some(open) = expr.find('[') else {
        if expr.is_empty() {
            return Err(malformed(expr, "empty node list"));
        }
        return Ok(vec![expr.to_string()]);
    };

    let prefix = &expr[..open];
    if prefix.is_empty() {
        return Err(malformed(expr, "missing host prefix before '['"));
    }
    let Some(rest) = expr[open + 1..].strip_suffix(']') else {
        return Err(malformed(expr, "missing closing ']'"));
    };

    let mut names = Vec::new();
    for token in rest.split(',') {
        expand_range_token(expr, prefix, token.trim(), &mut names)?;
    }
    Ok(names)
}

fn expand_range_token(
    expr: &str,
    prefix: &str,
    token: &str,
    out: &mut Vec<String>,
) -> Result<()> {
    let re = Regex::new(r"^(\d+)(?:-(\d+))?$").expect("hard-coded regex is valid");
    let caps = re
        .captures(token)
        .ok_or_else(|| malformed(expr, format!("bad range token '{token}'")))?;

    let start_str = &caps[1];
    let width = start_str.len();
    let start: u64 = start_str
        .parse()
        .map_err(|_| malformed(expr, format!("bad range start '{start_str}'")))?;

    let end = match caps.get(2) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| malformed(expr, format!("bad range end '{}'", m.as_str())))?,
        None => start,
    };
    if end < start {
        return Err(malformed(expr, format!("descending range '{token}'")));
    }

    for i in start..=end {
        out.push(format!("{prefix}{i:0width$}"));
    }
    Ok(())
}

fn malformed(expr: &str, reason: impl Into<String>) -> StagerunError {
    StagerunError::NodeList {
        expr: expr.to_string(),
        reason: reason.into(),
    }
}
