// src/exec/scheduler.rs

//! Concurrent executor.
//!
//! One Tokio task is spawned per node, all at once. Ordering is enforced only
//! by each task waiting on its dependencies' completion signals, so launch
//! order never affects correctness. A single semaphore caps how many task
//! bodies run at the same time.
//!
//! Per node task:
//! 1. wait for every dependency; if one carries an error, record
//!    `BlockedByDependency` and signal without taking a permit;
//! 2. acquire a permit (the only admission control);
//! 3. bind arguments and invoke the task body, catching faults;
//! 4. release the permit, record the first error, signal completion.
//!
//! Debug snapshots never run under a permit: the Running snapshot is
//! published concurrently with the body, the rest after the permit is gone.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::dag::export::to_dot;
use crate::dag::{Node, NodeId, NodeState};
use crate::errors::WorkflowError;
use crate::exec::binder::bind_arguments;
use crate::exec::sink::ExportSink;
use crate::types::Value;

/// Everything a run needs, detached from the [`crate::dag::Workflow`] so it
/// can be shared across spawned tasks.
pub(crate) struct RunPlan {
    /// Indexed by node id. Clones share their cells with the workflow.
    pub nodes: Arc<[Node]>,
    pub launch_order: Vec<NodeId>,
    pub concurrency_limit: usize,
    /// Present only in debug mode.
    pub sink: Option<Arc<dyn ExportSink>>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// The first error recorded by any node.
    pub first_error: Option<WorkflowError>,
    /// Every node error, in node order.
    pub errors: Vec<WorkflowError>,
    /// Number of nodes that completed successfully.
    pub completed: usize,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.first_error.is_none()
    }

    /// Collapse to the single-error contract of [`crate::dag::Workflow::run`].
    pub fn into_result(self) -> Result<(), WorkflowError> {
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Write-once holder for the run's reported error.
///
/// Checked without the lock first, then re-checked under it.
#[derive(Default)]
struct FirstError {
    seen: AtomicBool,
    slot: Mutex<Option<WorkflowError>>,
}

impl FirstError {
    fn record(&self, err: &WorkflowError) {
        if self.seen.load(Ordering::Acquire) {
            return;
        }
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(err.clone());
            self.seen.store(true, Ordering::Release);
        }
    }

    fn take(&self) -> Option<WorkflowError> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Serialises snapshot publication so sink writes never interleave.
struct Snapshots {
    nodes: Arc<[Node]>,
    sink: Arc<dyn ExportSink>,
    gate: tokio::sync::Mutex<()>,
}

impl Snapshots {
    async fn publish(&self) {
        let _guard = self.gate.lock().await;
        let dot = to_dot(&self.nodes);
        if let Err(e) = self.sink.publish(dot).await {
            let message = format!("{e:#}");
            warn!(error = %message, "graph snapshot sink failed; continuing");
        }
    }
}

/// Run every node in `plan` to a terminal state.
pub(crate) async fn execute(plan: RunPlan) -> RunReport {
    let RunPlan {
        nodes,
        launch_order,
        concurrency_limit,
        sink,
    } = plan;

    info!(
        nodes = nodes.len(),
        concurrency_limit, "workflow run started"
    );

    let permits = Arc::new(Semaphore::new(concurrency_limit));
    let first_error = Arc::new(FirstError::default());
    let snapshots = sink.map(|sink| {
        Arc::new(Snapshots {
            nodes: Arc::clone(&nodes),
            sink,
            gate: tokio::sync::Mutex::new(()),
        })
    });

    let mut tasks = JoinSet::new();
    for id in launch_order {
        let runner = NodeRunner {
            id,
            nodes: Arc::clone(&nodes),
            permits: Arc::clone(&permits),
            first_error: Arc::clone(&first_error),
            snapshots: snapshots.clone(),
        };
        tasks.spawn(runner.run());
    }

    // Barrier: every node task must finish.
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "node task aborted unexpectedly");
        }
    }

    if let Some(snapshots) = &snapshots {
        snapshots.publish().await;
    }

    let errors: Vec<WorkflowError> = nodes.iter().filter_map(|n| n.error().cloned()).collect();
    let completed = nodes
        .iter()
        .filter(|n| n.state() == NodeState::Completed)
        .count();
    let first_error = first_error.take();

    match &first_error {
        None => info!(completed, "workflow run finished"),
        Some(err) => warn!(
            completed,
            failed = errors.len(),
            error = %err,
            "workflow run finished with errors"
        ),
    }

    RunReport {
        first_error,
        errors,
        completed,
    }
}

struct NodeRunner {
    id: NodeId,
    nodes: Arc<[Node]>,
    permits: Arc<Semaphore>,
    first_error: Arc<FirstError>,
    snapshots: Option<Arc<Snapshots>>,
}

impl NodeRunner {
    async fn run(self) {
        let node = &self.nodes[self.id.index()];

        if let Err(blocked) = self.wait_for_dependencies(node).await {
            warn!(
                node = %node.id,
                task = %node.task_name(),
                error = %blocked,
                "skipping node: dependency failed"
            );
            self.finish(node, Err(blocked)).await;
            return;
        }

        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                let fault = WorkflowError::RuntimeFault {
                    node: node.id,
                    task: node.task_name().to_string(),
                    message: format!("admission control unavailable: {e}"),
                };
                self.finish(node, Err(fault)).await;
                return;
            }
        };

        node.cell.advance(NodeState::Running);
        info!(node = %node.id, task = %node.task_name(), "running node");

        // The permit covers the body only; the Running snapshot is published
        // alongside it and never holds the slot past the body's end.
        let body = async {
            let outcome = invoke(node, &self.nodes).await;
            drop(permit);
            outcome
        };
        let (outcome, ()) = tokio::join!(body, self.snapshot());

        self.finish(node, outcome).await;
    }

    /// Wait on each dependency in declaration order. The first dependency
    /// found carrying an error blocks this node.
    async fn wait_for_dependencies(&self, node: &Node) -> Result<(), WorkflowError> {
        for &dep_id in &node.deps {
            let dep = &self.nodes[dep_id.index()];
            debug!(node = %node.id, dependency = %dep_id, "waiting on dependency");
            dep.cell.wait_done().await;

            if let Some(err) = dep.error() {
                return Err(WorkflowError::BlockedByDependency {
                    node: node.id,
                    dependency: dep_id,
                    source: Arc::new(err.clone()),
                });
            }
        }
        Ok(())
    }

    /// Finalise the outcome, report it, then signal dependents.
    async fn finish(&self, node: &Node, outcome: Result<Value, WorkflowError>) {
        node.cell.finish(outcome);

        match node.error() {
            Some(err) => {
                if !err.is_blocked() {
                    warn!(node = %node.id, task = %node.task_name(), error = %err, "node failed");
                }
                self.first_error.record(err);
            }
            None => info!(node = %node.id, task = %node.task_name(), "node completed"),
        }

        node.cell.signal_done();
        self.snapshot().await;
    }

    async fn snapshot(&self) {
        if let Some(snapshots) = &self.snapshots {
            snapshots.publish().await;
        }
    }
}

/// Bind arguments and run the task body on its own Tokio task so that a
/// panic surfaces as a `RuntimeFault` instead of tearing down the run.
async fn invoke(node: &Node, nodes: &[Node]) -> Result<Value, WorkflowError> {
    let args = bind_arguments(node, nodes);

    if let Err(shape) = node.task.check_call_shape(&args) {
        node.cell.set_bound_args(args);
        return Err(WorkflowError::RuntimeFault {
            node: node.id,
            task: node.task_name().to_string(),
            message: format!("invalid call: {shape}"),
        });
    }

    node.cell.set_bound_args(args.clone());
    let task = node.task.clone();
    let body = tokio::spawn(async move { task.invoke(args).await });

    match body.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(failure)) => Err(WorkflowError::TaskFailure {
            node: node.id,
            task: node.task_name().to_string(),
            message: format!("{failure:#}"),
        }),
        Err(join_err) => Err(WorkflowError::RuntimeFault {
            node: node.id,
            task: node.task_name().to_string(),
            message: fault_message(join_err),
        }),
    }
}

fn fault_message(err: JoinError) -> String {
    if !err.is_panic() {
        return format!("task body did not complete: {err}");
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic: {msg}")
    } else {
        "panic: <non-string payload>".to_string()
    }
}
