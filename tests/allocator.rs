// tests/allocator.rs

use std::collections::HashSet;

use proptest::prelude::*;

use stagerun::sched::{allocate, Job, Node};

fn refs(nodes: &[Node]) -> Vec<&Node> {
    nodes.iter().collect()
}

#[test]
fn exact_fit_on_a_single_node() {
    let nodes = vec![Node::new("n0", 4)];
    let job = Job::new("j", "true").with_cores(4);

    let alloc = allocate(&refs(&nodes), &job).unwrap();
    assert_eq!(alloc.span(), 1);
    assert_eq!(alloc.total_cores(), 4);
    assert_eq!(alloc.node_names(), vec!["n0".to_string()]);
}

#[test]
fn request_spills_onto_later_nodes() {
    let nodes = vec![Node::new("n0", 2), Node::new("n1", 2)];
    let job = Job::new("j", "true").with_cores(3);

    let alloc = allocate(&refs(&nodes), &job).unwrap();
    assert_eq!(
        alloc.slots(),
        &[("n0".to_string(), 2), ("n1".to_string(), 1)]
    );
}

#[test]
fn too_large_a_request_yields_none() {
    let nodes = vec![Node::new("n0", 1)];
    let job = Job::new("j", "true").with_cores(2);
    assert!(allocate(&refs(&nodes), &job).is_none());
}

#[test]
fn minimum_span_spreads_cores_over_nodes() {
    // 4 cores fit on n0 alone, but the job insists on two nodes.
    let nodes = vec![Node::new("n0", 4), Node::new("n1", 4), Node::new("n2", 4)];
    let job = Job::new("j", "true").with_cores(4).with_nodes(2);

    let alloc = allocate(&refs(&nodes), &job).unwrap();
    assert_eq!(alloc.span(), 2);
    assert_eq!(alloc.total_cores(), 4);
    // Every spanned node carries at least one core.
    assert!(alloc.slots().iter().all(|(_, cores)| *cores >= 1));
}

#[test]
fn span_beyond_free_nodes_yields_none() {
    let nodes = vec![Node::new("n0", 8), Node::new("n1", 8)];
    let job = Job::new("j", "true").with_cores(3).with_nodes(3);
    assert!(allocate(&refs(&nodes), &job).is_none());
}

#[test]
fn memory_requirement_caps_per_node_contribution() {
    // 8 cores each, but 8 GB with 4 GB/core means only 2 schedulable cores.
    let nodes = vec![
        Node::new("n0", 8).with_mem(8.0),
        Node::new("n1", 8).with_mem(8.0),
    ];
    let job = Job::new("j", "true").with_cores(3).with_mem_per_core(4.0);

    let alloc = allocate(&refs(&nodes), &job).unwrap();
    assert_eq!(
        alloc.slots(),
        &[("n0".to_string(), 2), ("n1".to_string(), 1)]
    );
}

#[test]
fn memory_starved_pool_yields_none() {
    let nodes = vec![Node::new("n0", 8).with_mem(8.0)];
    let job = Job::new("j", "true").with_cores(3).with_mem_per_core(4.0);
    assert!(allocate(&refs(&nodes), &job).is_none());
}

proptest! {
    #[test]
    fn allocations_satisfy_the_request(
        core_counts in proptest::collection::vec(1u32..8, 1..6),
        cores in 1u32..20,
        span in 1u32..4,
    ) {
        let nodes: Vec<Node> = core_counts
            .iter()
            .enumerate()
            .map(|(i, &c)| Node::new(format!("n{i}"), c))
            .collect();
        let job = Job::new("j", "true")
            .with_cores(cores.max(span))
            .with_nodes(span);

        if let Some(alloc) = allocate(&refs(&nodes), &job) {
            // Exactly the requested cores, over at least the requested span.
            prop_assert_eq!(alloc.total_cores(), job.cores());
            prop_assert!(alloc.span() >= job.nodes() as usize);

            // Distinct nodes, all drawn from the pool, none over capacity.
            let mut seen = HashSet::new();
            for (name, taken) in alloc.slots() {
                prop_assert!(seen.insert(name.clone()), "node {} allocated twice", name);
                let node = nodes.iter().find(|n| n.name() == name);
                prop_assert!(node.is_some(), "unknown node {}", name);
                prop_assert!(*taken <= node.unwrap().cores());
            }
        }
    }
}
