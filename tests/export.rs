// tests/export.rs

mod common;
use crate::common::{ExecutionLog, RecordingSink, TaskKit, TestResult, init_tracing, with_timeout};

use flowdag::dag::Workflow;
use flowdag::exec::{DotFileSink, ExportSink};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

fn two_node_chain(kit: &TaskKit, debug: bool, second_fails: bool) -> Workflow {
    let mut wf = Workflow::new(2, debug).unwrap();
    let a = wf.create_node(kit.task("A", 5, "a"), []);
    let b = if second_fails {
        wf.create_node(kit.failing("B", 5, "nope"), [])
    } else {
        wf.create_node(kit.task("B", 5, "b"), [])
    };
    wf.add_dependency(b, [a]).unwrap();
    wf
}

#[test]
fn export_lists_nodes_then_edges_in_gray_before_run() {
    let kit = TaskKit::new();
    let wf = two_node_chain(&kit, false, false);

    let expected = "digraph G {\n\
                    \x20   node0 [label=\"A\", color=gray, style=filled];\n\
                    \x20   node1 [label=\"B\", color=gray, style=filled];\n\
                    \x20   node0 -> node1;\n\
                    }";
    assert_eq!(wf.to_dot(), expected);
}

#[test]
fn export_is_idempotent() {
    let kit = TaskKit::new();
    let wf = two_node_chain(&kit, false, false);
    assert_eq!(wf.to_dot(), wf.to_dot());
}

#[test]
fn export_escapes_labels() -> TestResult {
    let kit = TaskKit::new();
    let mut wf = Workflow::new(1, false)?;
    wf.create_node(kit.task(r#"say "hi" \o/"#, 0, ()), []);

    assert!(wf.to_dot().contains(r#"[label="say \"hi\" \\o/", color=gray"#));
    Ok(())
}

#[tokio::test]
async fn export_colours_reflect_final_states() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let wf = two_node_chain(&kit, false, true);

    let _ = with_timeout(wf.run(false)).await;

    let dot = wf.to_dot();
    assert!(dot.contains("node0 [label=\"A\", color=blue, style=filled];"));
    assert!(dot.contains("node1 [label=\"B\", color=red, style=filled];"));
    assert_eq!(dot, wf.to_dot());
    Ok(())
}

#[tokio::test]
async fn debug_run_publishes_snapshots_to_sink() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let sink = RecordingSink::new();
    let wf = two_node_chain(&kit, true, false).with_sink(sink.clone());

    with_timeout(wf.run(false)).await?;

    // Each node: entering Running + finishing. Plus one after the barrier.
    let snapshots = sink.snapshots();
    assert_eq!(snapshots.len(), 5);
    assert!(snapshots[0].contains("node0 [label=\"A\", color=green"));
    assert!(snapshots[0].contains("node1 [label=\"B\", color=gray"));
    assert_eq!(sink.last().unwrap(), wf.to_dot());
    assert!(!wf.to_dot().contains("green"));
    Ok(())
}

#[tokio::test]
async fn failing_sink_does_not_change_outcome() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let sink = RecordingSink::failing();
    let wf = two_node_chain(&kit, true, false).with_sink(sink.clone());

    with_timeout(wf.run(false)).await?;

    assert_eq!(sink.snapshots().len(), 5);
    for node in wf.nodes() {
        assert!(node.error().is_none());
    }
    Ok(())
}

#[tokio::test]
async fn sink_is_ignored_without_debug() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let sink = RecordingSink::new();
    let wf = two_node_chain(&kit, false, false).with_sink(sink.clone());

    with_timeout(wf.run(false)).await?;

    assert!(sink.snapshots().is_empty());
    Ok(())
}

#[tokio::test]
async fn debug_without_sink_still_runs() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let wf = two_node_chain(&kit, true, false);

    with_timeout(wf.run(false)).await?;
    assert_eq!(kit.log.started().len(), 2);
    Ok(())
}

#[tokio::test]
async fn dot_file_sink_leaves_final_graph_on_disk() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("workflow.dot");

    let kit = TaskKit::new();
    let sink = Arc::new(DotFileSink::new(&path));
    let wf = two_node_chain(&kit, true, true).with_sink(sink);

    let _ = with_timeout(wf.run(false)).await;

    let written = std::fs::read_to_string(&path)?;
    assert_eq!(written, wf.to_dot());
    assert!(written.contains("color=red"));
    Ok(())
}

/// Holds every publish until the named task body has started.
struct WaitForBodySink {
    log: Arc<ExecutionLog>,
    task: &'static str,
}

impl ExportSink for WaitForBodySink {
    fn publish(&self, _dot: String) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            while !self.log.has_started(self.task) {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            Ok(())
        })
    }
}

#[tokio::test]
async fn running_snapshot_does_not_hold_the_only_permit() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let sink = Arc::new(WaitForBodySink {
        log: Arc::clone(&kit.log),
        task: "A",
    });

    let mut wf = Workflow::new(1, true)?.with_sink(sink);
    wf.create_node(kit.task("A", 5, ()), []);
    wf.create_node(kit.task("B", 5, ()), []);

    // A sink publishing under the permit would wait on a body that can
    // never start, and the run would time out.
    with_timeout(wf.run(false)).await?;

    assert_eq!(kit.log.started().len(), 2);
    assert_eq!(kit.probe.peak(), 1);
    Ok(())
}
