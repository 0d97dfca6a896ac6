// src/dag/workflow.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::dag::export::to_dot;
use crate::dag::node::{Node, NodeId, Slot};
use crate::dag::toposort::topological_order;
use crate::errors::WorkflowError;
use crate::exec::scheduler::{self, RunPlan, RunReport};
use crate::exec::{ExportSink, LogSink, Task};
use crate::types::{Value, ValueKind};

/// A set of nodes and dependency edges, plus run configuration.
///
/// Build the graph with [`Workflow::create_node`] / [`Workflow::add_dependency`],
/// then call [`Workflow::run`] once. After the run every node is terminal and
/// can be inspected through [`Workflow::node`] or [`Workflow::to_dot`].
pub struct Workflow {
    nodes: Vec<Node>,
    concurrency_limit: usize,
    debug: bool,
    sink: Option<Arc<dyn ExportSink>>,
    started: AtomicBool,
}

impl Workflow {
    /// Create an empty workflow.
    ///
    /// `concurrency_limit` is the maximum number of task bodies executing at
    /// once and must be at least 1. `debug` enables live snapshots through the
    /// attached [`ExportSink`] (or the tracing log when none is attached).
    pub fn new(concurrency_limit: usize, debug: bool) -> Result<Self, WorkflowError> {
        if concurrency_limit == 0 {
            return Err(WorkflowError::InvalidConfig(
                "concurrency limit must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            nodes: Vec::new(),
            concurrency_limit,
            debug,
            sink: None,
            started: AtomicBool::new(false),
        })
    }

    /// Attach the sink that receives graph snapshots in debug mode.
    pub fn with_sink(mut self, sink: Arc<dyn ExportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn set_sink(&mut self, sink: Arc<dyn ExportSink>) {
        self.sink = Some(sink);
    }

    /// Register a node. `presets` fill the leading argument slots; the rest
    /// are left empty and are bound from dependency results at run time.
    pub fn create_node(&mut self, task: Task, presets: impl IntoIterator<Item = Value>) -> NodeId {
        self.create_node_with(task, presets.into_iter().map(Some))
    }

    /// Register a node with a sparse set of preset arguments (`None` leaves
    /// the slot at that position empty).
    pub fn create_node_with(
        &mut self,
        task: Task,
        presets: impl IntoIterator<Item = Option<Value>>,
    ) -> NodeId {
        let inputs = task.inputs().to_vec();
        let mut slots: Vec<Slot> = presets
            .into_iter()
            .enumerate()
            .map(|(i, preset)| match preset {
                Some(v) => Slot::Preset(v),
                None => Slot::Empty(inputs.get(i).copied().unwrap_or(ValueKind::Unit)),
            })
            .collect();

        while slots.len() < inputs.len() {
            slots.push(Slot::Empty(inputs[slots.len()]));
        }

        let id = NodeId(self.nodes.len());
        debug!(node = %id, task = %task.name(), slots = slots.len(), "node created");
        self.nodes.push(Node::new(id, task, slots));
        id
    }

    /// Declare that `node` depends on each of `deps`.
    ///
    /// Edges are kept in declaration order and duplicates are ignored. Cycles
    /// are not detected here; see [`Workflow::topological_order`].
    pub fn add_dependency(
        &mut self,
        node: NodeId,
        deps: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), WorkflowError> {
        self.ensure_known(node)?;
        let deps: Vec<NodeId> = deps.into_iter().collect();

        for &dep in &deps {
            self.ensure_known(dep)?;
            if dep == node {
                return Err(WorkflowError::InvalidConfig(format!(
                    "node {node} cannot depend on itself"
                )));
            }
        }

        let target = &mut self.nodes[node.index()];
        for dep in deps {
            if !target.deps.contains(&dep) {
                debug!(node = %node, dependency = %dep, "dependency added");
                target.deps.push(dep);
            }
        }
        Ok(())
    }

    /// Feed the result of `dep` into argument slot `slot` of `node`.
    ///
    /// Adds the dependency edge if it does not exist yet. The slot must be
    /// empty; explicit bindings take precedence over kind matching.
    pub fn bind_input(&mut self, node: NodeId, slot: usize, dep: NodeId) -> Result<(), WorkflowError> {
        self.ensure_known(node)?;
        self.ensure_known(dep)?;

        let target = &self.nodes[node.index()];
        match target.slots.get(slot) {
            None => {
                return Err(WorkflowError::InvalidConfig(format!(
                    "node {node} ({}) has no argument slot {slot}",
                    target.task_name()
                )));
            }
            Some(Slot::Preset(_)) => {
                return Err(WorkflowError::InvalidConfig(format!(
                    "argument slot {slot} of node {node} is preset and cannot be bound"
                )));
            }
            Some(Slot::Empty(_)) => {}
        }

        self.add_dependency(node, [dep])?;
        self.nodes[node.index()].bindings.insert(slot, dep);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// All nodes, in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Dependencies-first ordering of all nodes, or `CycleDetected`.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, WorkflowError> {
        topological_order(&self.nodes)
    }

    /// Current graph description in DOT format.
    pub fn to_dot(&self) -> String {
        to_dot(&self.nodes)
    }

    /// Run every node once and return the first error observed, if any.
    ///
    /// With `use_ordering_precheck`, the graph is sorted first and a cycle
    /// fails the run before any node starts. Without it, a cyclic graph never
    /// completes.
    pub async fn run(&self, use_ordering_precheck: bool) -> Result<(), WorkflowError> {
        self.run_collecting(use_ordering_precheck)
            .await?
            .into_result()
    }

    /// Like [`Workflow::run`], but returns every node error as well as the
    /// first one. `Err` is only returned when the run could not start.
    pub async fn run_collecting(
        &self,
        use_ordering_precheck: bool,
    ) -> Result<RunReport, WorkflowError> {
        let launch_order = if use_ordering_precheck {
            topological_order(&self.nodes)?
        } else {
            self.nodes.iter().map(Node::id).collect()
        };

        if self.started.swap(true, Ordering::AcqRel) {
            return Err(WorkflowError::InvalidConfig(
                "workflow has already been run".to_string(),
            ));
        }

        let plan = RunPlan {
            nodes: self.nodes.iter().cloned().collect(),
            launch_order,
            concurrency_limit: self.concurrency_limit,
            sink: self.debug.then(|| {
                self.sink
                    .clone()
                    .unwrap_or_else(|| Arc::new(LogSink) as Arc<dyn ExportSink>)
            }),
        };

        Ok(scheduler::execute(plan).await)
    }

    fn ensure_known(&self, id: NodeId) -> Result<(), WorkflowError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidConfig(format!(
                "node {id} does not belong to this workflow"
            )))
        }
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("nodes", &self.nodes)
            .field("concurrency_limit", &self.concurrency_limit)
            .field("debug", &self.debug)
            .finish()
    }
}
