// tests/config_behaviour.rs

use stagerun::cmdline::{shell_quote, CommandSpec};
use stagerun::config::model::PipelineFile;
use stagerun::config::validate_config;
use stagerun::dag::JobGraph;
use stagerun::errors::StagerunError;

fn parse(toml_src: &str) -> PipelineFile {
    toml::from_str(toml_src).expect("test TOML should deserialize")
}

fn expect_config_error(toml_src: &str) -> String {
    let cfg = parse(toml_src);
    match validate_config(&cfg).unwrap_err() {
        StagerunError::Config(msg) => msg,
        other => panic!("expected Config error, got {other}"),
    }
}

#[test]
fn minimal_file_gets_defaults() {
    let cfg = parse(
        r#"
        [job.a]
        cmd = "echo hi"
        "#,
    );
    assert_eq!(cfg.run.log_dir, "logs");
    assert_eq!(cfg.run.interval, 3.0);
    assert_eq!(cfg.run.timeout, None);

    let job = &cfg.job["a"];
    assert_eq!(job.cores, 1);
    assert_eq!(job.nodes, 1);
    assert!(job.after.is_empty());
    assert_eq!(job.effective_cmd().as_deref(), Some("echo hi"));

    validate_config(&cfg).unwrap();
}

#[test]
fn empty_file_is_rejected() {
    let msg = expect_config_error("");
    assert!(msg.contains("at least one"));
}

#[test]
fn job_needs_exactly_one_command_form() {
    let msg = expect_config_error(
        r#"
        [job.a]
        cores = 1
        "#,
    );
    assert!(msg.contains("either `cmd` or `command`"));

    let msg = expect_config_error(
        r#"
        [job.a]
        cmd = "echo hi"
        command = { program = "echo", args = ["hi"] }
        "#,
    );
    assert!(msg.contains("both"));
}

#[test]
fn dependency_references_are_checked() {
    let msg = expect_config_error(
        r#"
        [job.a]
        cmd = "echo hi"
        after = ["ghost"]
        "#,
    );
    assert!(msg.contains("unknown dependency 'ghost'"));

    let msg = expect_config_error(
        r#"
        [job.a]
        cmd = "echo hi"
        after = ["a"]
        "#,
    );
    assert!(msg.contains("cannot depend on itself"));
}

#[test]
fn cycles_are_detected() {
    let cfg = parse(
        r#"
        [job.a]
        cmd = "echo a"
        after = ["b"]

        [job.b]
        cmd = "echo b"
        after = ["a"]
        "#,
    );
    let err = validate_config(&cfg).unwrap_err();
    let StagerunError::GraphCycle(node) = &err else {
        panic!("expected GraphCycle, got {err}");
    };
    assert!(node == "a" || node == "b", "carries a bare job name, got {node:?}");
    // The display wraps the name exactly once.
    assert_eq!(
        err.to_string(),
        format!("cycle detected in job graph involving '{node}'")
    );
}

#[test]
fn resource_requests_are_sanity_checked() {
    let msg = expect_config_error(
        r#"
        [job.a]
        cmd = "echo hi"
        cores = 0
        "#,
    );
    assert!(msg.contains("at least one core"));

    let msg = expect_config_error(
        r#"
        [job.a]
        cmd = "echo hi"
        cores = 2
        nodes = 4
        "#,
    );
    assert!(msg.contains("at least one core"));

    let msg = expect_config_error(
        r#"
        [run]
        interval = 0.0

        [job.a]
        cmd = "echo hi"
        "#,
    );
    assert!(msg.contains("interval"));
}

#[test]
fn structured_command_renders_with_quoting() {
    let cfg = parse(
        r#"
        [job.analyse.command]
        program = "python"
        args = ["analyse.py"]
        flags = { "--input" = "data file.h5", "--verbose" = "" }
        "#,
    );
    let cmd = cfg.job["analyse"].effective_cmd().unwrap();
    // Flags render in sorted order; valueless flags stand alone.
    assert_eq!(cmd, "python analyse.py --input 'data file.h5' --verbose");
}

#[test]
fn shell_quoting_escapes_single_quotes() {
    assert_eq!(shell_quote("plain-word_1.txt"), "plain-word_1.txt");
    assert_eq!(shell_quote("two words"), "'two words'");
    assert_eq!(shell_quote("don't"), r"'don'\''t'");
    assert_eq!(shell_quote(""), "''");
}

#[test]
fn graph_is_built_in_name_order_with_dependencies() {
    let cfg = parse(
        r#"
        [job.b]
        cmd = "echo b"
        after = ["a"]

        [job.a]
        cmd = "echo a"
        "#,
    );
    validate_config(&cfg).unwrap();

    let graph = JobGraph::from_config(&cfg).unwrap();
    // Jobs are keyed alphabetically regardless of file order.
    let names: Vec<&str> = graph.names().collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(graph.dependencies_of("b"), &["a".to_string()]);
    assert!(graph.dependencies_of("a").is_empty());
    assert_eq!(graph.job("b").unwrap().cmd(), "echo b");
}
