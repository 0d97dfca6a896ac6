// tests/config_pipeline.rs

mod common;
use crate::common::builders::{NodeConfigBuilder, PipelineBuilder};
use crate::common::{TestResult, init_tracing, with_timeout};

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use flowdag::config::{PipelineFile, build_workflow, load_and_validate, parse_str};
use flowdag::dag::NodeState;
use flowdag::errors::{FlowdagError, WorkflowError};
use flowdag::types::{Value, ValueKind};

fn sample_pipeline_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pipelines/ride_hailing.toml")
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[node]]
name = "A"
after = ["B"]

[[node]]
name = "B"
after = ["A"]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(FlowdagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[node]]
name = "A"
after = ["NonExistent"]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(FlowdagError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[[node]\nname = ").unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(FlowdagError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("missing.toml")),
        Err(FlowdagError::IoError(_))
    ));
}

#[test]
fn validation_rejects_bad_pipelines() {
    let cases = vec![
        ("empty", PipelineBuilder::new().build_raw(), "at least one"),
        (
            "zero concurrency",
            PipelineBuilder::new()
                .with_concurrency(0)
                .with_node(NodeConfigBuilder::new("A").build())
                .build_raw(),
            "concurrency",
        ),
        (
            "duplicate",
            PipelineBuilder::new()
                .with_node(NodeConfigBuilder::new("A").build())
                .with_node(NodeConfigBuilder::new("A").build())
                .build_raw(),
            "duplicate",
        ),
        (
            "self dependency",
            PipelineBuilder::new()
                .with_node(NodeConfigBuilder::new("A").after(&["A"]).build())
                .build_raw(),
            "itself",
        ),
        (
            "too many args",
            PipelineBuilder::new()
                .with_node(NodeConfigBuilder::new("A").args(vec![Value::Int(1)]).build())
                .build_raw(),
            "presets",
        ),
        (
            "arg kind",
            PipelineBuilder::new()
                .with_node(
                    NodeConfigBuilder::new("A")
                        .inputs(&[ValueKind::Int])
                        .args(vec![Value::from("x")])
                        .build(),
                )
                .build_raw(),
            "declared int",
        ),
    ];

    for (label, raw, needle) in cases {
        match PipelineFile::try_from(raw) {
            Err(FlowdagError::ConfigError(msg)) => {
                assert!(msg.contains(needle), "{label}: unexpected message {msg}")
            }
            other => panic!("{label}: expected ConfigError, got {other:?}"),
        }
    }
}

#[test]
fn parses_values_and_kinds() -> TestResult {
    let raw = parse_str(
        r#"
[config]
concurrency = 3
precheck = true

[[node]]
name = "drivers"
output = ["Driver1", "Driver2"]

[[node]]
name = "count"
inputs = ["string", "list"]
args = ["prefix"]
output = 2
after = ["drivers"]

[[node]]
name = "ratio"
output = 0.5
fail = "nope"
"#,
    )?;
    let pipeline = PipelineFile::try_from(raw)?;

    assert_eq!(pipeline.config.concurrency, 3);
    assert!(pipeline.config.precheck);
    assert!(!pipeline.config.debug);

    let drivers = pipeline.node_named("drivers").unwrap();
    assert_eq!(
        drivers.effective_output(),
        Value::List(vec![Value::from("Driver1"), Value::from("Driver2")])
    );

    let count = pipeline.node_named("count").unwrap();
    assert_eq!(count.inputs, vec![ValueKind::Text, ValueKind::List]);
    assert_eq!(count.effective_output(), Value::Int(2));

    assert_eq!("string".parse::<ValueKind>(), Ok(ValueKind::Text));
    assert!("tuple".parse::<ValueKind>().is_err());

    let ratio = pipeline.node_named("ratio").unwrap();
    assert_eq!(ratio.effective_output(), Value::Float(0.5));
    assert_eq!(ratio.fail.as_deref(), Some("nope"));
    Ok(())
}

#[tokio::test]
async fn built_workflow_binds_results_between_nodes() -> TestResult {
    init_tracing();
    let pipeline = PipelineBuilder::new()
        .with_node(NodeConfigBuilder::new("name").output("Ada").build())
        .with_node(
            NodeConfigBuilder::new("greet")
                .inputs(&[ValueKind::Text, ValueKind::Text])
                .args(vec![Value::from("Hello")])
                .output("greeted")
                .after(&["name"])
                .build(),
        )
        .build();

    let wf = build_workflow(&pipeline, 2, false)?;
    with_timeout(wf.run(true)).await?;

    let greet = &wf.nodes()[1];
    assert_eq!(greet.task_name(), "greet");
    assert_eq!(greet.arguments(), vec![Value::from("Hello"), Value::from("Ada")]);
    assert_eq!(greet.result(), Some(&Value::from("greeted")));
    Ok(())
}

#[tokio::test]
async fn sample_pipeline_fails_only_at_promotions() -> TestResult {
    init_tracing();
    let mut pipeline = load_and_validate(sample_pipeline_path())?;
    assert_eq!(pipeline.node.len(), 12);
    for node in &mut pipeline.node {
        node.sleep_ms = 0;
    }

    let wf = build_workflow(&pipeline, 2, false)?;
    let report = with_timeout(wf.run_collecting(true)).await?;

    assert_eq!(report.completed, 10);
    assert_eq!(report.errors.len(), 2);

    match report.first_error.as_ref().unwrap() {
        WorkflowError::TaskFailure { task, message, .. } => {
            assert_eq!(task, "NotifyUserOfPromotions");
            assert_eq!(message, "Notification failed");
        }
        other => panic!("expected TaskFailure, got {other:?}"),
    }

    let finalize = wf.nodes().iter().find(|n| n.task_name() == "FinalizeRide").unwrap();
    assert_eq!(finalize.state(), NodeState::Errored);
    assert!(finalize.error().unwrap().is_blocked());
    Ok(())
}
