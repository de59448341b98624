// tests/runner_live.rs

//! End-to-end runner tests with real subprocesses and real log files.

#![cfg(unix)]

use std::time::{Duration, Instant};

use tempfile::TempDir;

use stagerun::dag::JobGraph;
use stagerun::errors::StagerunError;
use stagerun::sched::{Job, Node, Runner};
use stagerun_test_utils::init_tracing;

const FAST_POLL: Duration = Duration::from_millis(20);

fn graph(jobs: Vec<(Job, Vec<&str>)>) -> JobGraph {
    let mut g = JobGraph::new();
    for (job, after) in jobs {
        g.add_job(job, after.into_iter().map(str::to_string).collect())
            .unwrap();
    }
    g.ensure_acyclic().unwrap();
    g
}

#[tokio::test]
async fn parallel_jobs_write_their_own_logs() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let g = graph(vec![
        (Job::new("alpha", "echo hello-alpha"), vec![]),
        (Job::new("beta", "echo hello-beta 1>&2"), vec![]),
    ]);
    let nodes = vec![Node::new("n0", 1), Node::new("n1", 1)];

    let mut runner = Runner::new(nodes, g, tmp.path());
    runner.run(FAST_POLL, None).await.unwrap();

    let alpha = std::fs::read_to_string(tmp.path().join("alpha.out")).unwrap();
    assert!(alpha.contains("hello-alpha"));

    // stderr is merged into the same log file.
    let beta = std::fs::read_to_string(tmp.path().join("beta.out")).unwrap();
    assert!(beta.contains("hello-beta"));
}

#[tokio::test]
async fn serial_pipeline_completes_in_dependency_order() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let g = graph(vec![
        (Job::new("a", "echo first"), vec![]),
        (Job::new("b", "echo second"), vec!["a"]),
    ]);
    let nodes = vec![Node::new("n0", 1)];

    let mut runner = Runner::new(nodes, g, tmp.path());
    runner.run(FAST_POLL, None).await.unwrap();

    assert_eq!(runner.completed(), &["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn nonzero_exit_fails_the_run_and_skips_dependents() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let g = graph(vec![
        (Job::new("left", "echo left"), vec![]),
        (Job::new("right", "echo right"), vec![]),
        (Job::new("boom", "exit 3"), vec!["left", "right"]),
        (Job::new("never", "echo unreachable"), vec!["boom"]),
    ]);
    let nodes = vec![Node::new("n0", 1), Node::new("n1", 1)];

    let mut runner = Runner::new(nodes, g, tmp.path());
    let err = runner.run(FAST_POLL, None).await.unwrap_err();

    match err {
        StagerunError::FailedJob { job, .. } => assert_eq!(job, "boom"),
        other => panic!("expected FailedJob, got {other}"),
    }
    assert_eq!(runner.running_count(), 0);
    assert_eq!(runner.pool().assigned_count(), 0);
    // Both prerequisites finished before the failure; the dependent of the
    // failed job never left the queue.
    assert_eq!(runner.completed().len(), 2);
    assert!(runner.completed().contains(&"left".to_string()));
    assert!(runner.completed().contains(&"right".to_string()));
    assert!(runner.queued().contains(&"never".to_string()));
}

#[tokio::test]
async fn job_larger_than_the_pool_cannot_run() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let g = graph(vec![(Job::new("big", "echo hi").with_cores(2), vec![])]);
    let nodes = vec![Node::new("small", 1)];

    let mut runner = Runner::new(nodes, g, tmp.path());
    let err = runner.run(FAST_POLL, None).await.unwrap_err();
    assert!(matches!(err, StagerunError::CannotRun));
}

#[tokio::test]
async fn wall_clock_budget_kills_a_stuck_job() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let g = graph(vec![(Job::new("stuck", "sleep 30"), vec![])]);
    let nodes = vec![Node::new("n0", 1)];

    let started = Instant::now();
    let mut runner = Runner::new(nodes, g, tmp.path());
    let err = runner
        .run(Duration::from_millis(50), Some(Duration::from_millis(300)))
        .await
        .unwrap_err();

    assert!(matches!(err, StagerunError::TimeOut { .. }));
    assert_eq!(runner.running_count(), 0);
    // The run returns promptly instead of waiting out the sleep.
    assert!(started.elapsed() < Duration::from_secs(10));
}
