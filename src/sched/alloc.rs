// src/sched/alloc.rs

//! Pure allocation logic mapping a job's resource request onto free nodes.

use crate::sched::job::Job;
use crate::sched::node::Node;

/// A concrete assignment of cores on specific nodes to one job.
///
/// Covers exactly the job's core request and spans at least its requested
/// node count. Transient: it exists only while the job runs and is discarded
/// when the nodes are freed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    slots: Vec<(String, u32)>,
}

impl Allocation {
    /// (node name, cores used on that node) pairs, in allocation order.
    pub fn slots(&self) -> &[(String, u32)] {
        &self.slots
    }

    pub fn node_names(&self) -> Vec<String> {
        self.slots.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn total_cores(&self) -> u32 {
        self.slots.iter().map(|(_, cores)| cores).sum()
    }

    /// Number of distinct nodes the allocation spans.
    pub fn span(&self) -> usize {
        self.slots.len()
    }
}

/// Attempt to build an allocation for `job` from the given free nodes.
///
/// Greedy and order-sensitive: nodes are considered in the enumeration order
/// given. To honour the job's minimum node span, one core is first seeded on
/// each of the first `job.nodes()` usable nodes, then the remaining cores
/// are filled in order. Per-node contribution is the node's core count,
/// capped by memory when the job declares `mem_per_core`.
///
/// Returns `None` when the request cannot be met right now; this is not an
/// error, the job simply waits. Nothing is mutated either way.
pub fn allocate(free: &[&Node], job: &Job) -> Option<Allocation> {
    let span = job.nodes() as usize;

    let usable: Vec<(&Node, u32)> = free
        .iter()
        .map(|n| (*n, n.schedulable_cores(job.mem_per_core())))
        .filter(|(_, cap)| *cap > 0)
        .collect();
    if usable.len() < span {
        return None;
    }

    // Seed the minimum span. checked_sub keeps the function total even if a
    // job with cores < nodes slips past validation.
    let mut slots: Vec<(String, u32)> = usable[..span]
        .iter()
        .map(|(node, _)| (node.name().to_string(), 1))
        .collect();
    let mut remaining = job.cores().checked_sub(job.nodes())?;

    for (i, (node, cap)) in usable.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        let already = if i < span { 1 } else { 0 };
        let take = (cap - already).min(remaining);
        if take == 0 {
            continue;
        }
        if i < span {
            slots[i].1 += take;
        } else {
            slots.push((node.name().to_string(), take));
        }
        remaining -= take;
    }

    if remaining > 0 {
        None
    } else {
        Some(Allocation { slots })
    }
}
