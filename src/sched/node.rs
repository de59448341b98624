// src/sched/node.rs

use std::fmt;

use crate::sched::alloc::Allocation;

/// A named compute resource with a fixed core count and optional memory.
///
/// A node is wholly assigned to one job or wholly free: a job may use fewer
/// cores than the node has, but the remainder is not shared with other jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    cores: u32,
    mem: Option<f64>,
    assigned: bool,
}

impl Node {
    pub fn new(name: impl Into<String>, cores: u32) -> Self {
        Self {
            name: name.into(),
            cores,
            mem: None,
            assigned: false,
        }
    }

    /// Total memory on the node, in GB.
    pub fn with_mem(mut self, gb: f64) -> Self {
        self.mem = Some(gb);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    pub fn mem(&self) -> Option<f64> {
        self.mem
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    /// Mark this node as occupied by a job. Assignment state is owned by the
    /// runner loop; nothing else should flip it during a run.
    pub fn assign(&mut self) {
        self.assigned = true;
    }

    /// Mark this node as free again.
    pub fn free(&mut self) {
        self.assigned = false;
    }

    /// Cores this node can contribute to a job, accounting for a per-core
    /// memory requirement when the job declares one and the node's memory is
    /// known.
    pub fn schedulable_cores(&self, mem_per_core: Option<f64>) -> u32 {
        match (mem_per_core, self.mem) {
            (Some(per_core), Some(mem)) if per_core > 0.0 => {
                self.cores.min((mem / per_core).floor() as u32)
            }
            _ => self.cores,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node('{}', {})", self.name, self.cores)
    }
}

/// The pool of nodes available to a run.
///
/// Owned and mutated exclusively by the runner loop; allocation bookkeeping
/// goes through [`NodePool::apply`] and [`NodePool::release`] so a node's
/// assignment flag always mirrors the running set.
#[derive(Debug, Clone)]
pub struct NodePool {
    nodes: Vec<Node>,
}

impl NodePool {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes not currently assigned to any job, in pool order.
    pub fn free_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| !n.is_assigned()).collect()
    }

    pub fn assigned_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_assigned()).count()
    }

    /// Mark every node referenced by the allocation as assigned.
    pub(crate) fn apply(&mut self, alloc: &Allocation) {
        for (name, _) in alloc.slots() {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.name() == name) {
                node.assign();
            }
        }
    }

    /// Free every node referenced by the allocation.
    pub(crate) fn release(&mut self, alloc: &Allocation) {
        for (name, _) in alloc.slots() {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.name() == name) {
                node.free();
            }
        }
    }

    /// Free every node unconditionally; used on abort.
    pub(crate) fn free_all(&mut self) {
        for node in &mut self.nodes {
            node.free();
        }
    }
}
