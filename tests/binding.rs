// tests/binding.rs

mod common;
use crate::common::{TaskKit, TestResult, init_tracing, with_timeout};

use flowdag::dag::Workflow;
use flowdag::exec::Task;
use flowdag::types::{Value, ValueKind};

/// Returns its argument list unchanged, so the node result shows what was bound.
fn echo(name: &str, inputs: &[ValueKind]) -> Task {
    Task::infallible(name, inputs.to_vec(), |args| async move { Value::List(args) })
}

#[tokio::test]
async fn empty_slot_takes_first_dependency_of_matching_kind() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let mut wf = Workflow::new(2, false)?;

    let number = wf.create_node(kit.task("number", 5, 42i64), []);
    let text = wf.create_node(kit.task("text", 5, "hello"), []);
    let consumer = wf.create_node(echo("consumer", &[ValueKind::Text]), []);
    // The non-matching dependency is declared first.
    wf.add_dependency(consumer, [number, text])?;

    with_timeout(wf.run(false)).await?;

    assert_eq!(wf.node(number).unwrap().result().and_then(Value::as_int), Some(42));
    assert_eq!(wf.node(text).unwrap().result().and_then(Value::as_text), Some("hello"));

    let node = wf.node(consumer).unwrap();
    assert_eq!(node.arguments(), vec![Value::from("hello")]);
    assert_eq!(node.result().and_then(Value::as_list).map(<[Value]>::len), Some(1));
    assert_eq!(node.result(), Some(&Value::List(vec![Value::from("hello")])));
    Ok(())
}

#[tokio::test]
async fn first_matching_dependency_wins_among_same_kind() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let mut wf = Workflow::new(2, false)?;

    let first = wf.create_node(kit.task("first", 20, "one"), []);
    let second = wf.create_node(kit.task("second", 0, "two"), []);
    let consumer = wf.create_node(echo("consumer", &[ValueKind::Text]), []);
    wf.add_dependency(consumer, [first, second])?;

    with_timeout(wf.run(false)).await?;

    assert_eq!(wf.node(consumer).unwrap().arguments(), vec![Value::from("one")]);
    Ok(())
}

#[tokio::test]
async fn unmatched_slot_keeps_zero_value() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let mut wf = Workflow::new(2, false)?;

    let text = wf.create_node(kit.task("text", 0, "hello"), []);
    let consumer = wf.create_node(
        echo("consumer", &[ValueKind::Int, ValueKind::List]),
        [],
    );
    wf.add_dependency(consumer, [text])?;

    with_timeout(wf.run(false)).await?;

    assert_eq!(
        wf.node(consumer).unwrap().arguments(),
        vec![Value::Int(0), Value::List(Vec::new())]
    );
    Ok(())
}

#[tokio::test]
async fn presets_are_never_overwritten() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let mut wf = Workflow::new(2, false)?;

    let text = wf.create_node(kit.task("text", 0, "from dep"), []);
    let consumer = wf.create_node(
        echo("consumer", &[ValueKind::Text, ValueKind::Text]),
        [Value::from("preset")],
    );
    wf.add_dependency(consumer, [text])?;

    with_timeout(wf.run(false)).await?;

    assert_eq!(
        wf.node(consumer).unwrap().arguments(),
        vec![Value::from("preset"), Value::from("from dep")]
    );
    Ok(())
}

#[tokio::test]
async fn explicit_binding_beats_kind_matching() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let mut wf = Workflow::new(2, false)?;

    let first = wf.create_node(kit.task("first", 0, "one"), []);
    let second = wf.create_node(kit.task("second", 0, "two"), []);
    let consumer = wf.create_node(
        echo("consumer", &[ValueKind::Text, ValueKind::Text]),
        [],
    );
    wf.add_dependency(consumer, [first])?;
    wf.bind_input(consumer, 0, second)?;

    with_timeout(wf.run(false)).await?;

    let node = wf.node(consumer).unwrap();
    assert_eq!(node.dependencies(), &[first, second]);
    assert_eq!(node.arguments(), vec![Value::from("two"), Value::from("one")]);
    Ok(())
}

#[tokio::test]
async fn explicit_binding_of_wrong_kind_faults_at_invocation() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let mut wf = Workflow::new(1, false)?;

    let number = wf.create_node(kit.task("number", 0, 1i64), []);
    let consumer = wf.create_node(echo("consumer", &[ValueKind::Text]), []);
    wf.bind_input(consumer, 0, number)?;

    let err = with_timeout(wf.run(false)).await.unwrap_err();
    assert!(matches!(
        err,
        flowdag::errors::WorkflowError::RuntimeFault { node, .. } if node == consumer
    ));
    Ok(())
}

#[tokio::test]
async fn same_kind_slots_all_take_the_first_matching_dependency() -> TestResult {
    init_tracing();
    let kit = TaskKit::new();
    let mut wf = Workflow::new(2, false)?;

    let first = wf.create_node(kit.task("first", 0, "one"), []);
    let second = wf.create_node(kit.task("second", 0, "two"), []);
    let consumer = wf.create_node(
        echo("consumer", &[ValueKind::Text, ValueKind::Text]),
        [],
    );
    wf.add_dependency(consumer, [first, second])?;

    with_timeout(wf.run(false)).await?;

    // Matching is per slot: the second dependency is only reachable
    // through an explicit binding.
    assert_eq!(
        wf.node(consumer).unwrap().arguments(),
        vec![Value::from("one"), Value::from("one")]
    );
    Ok(())
}
