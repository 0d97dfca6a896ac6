// src/dag/node.rs

//! Node data model.
//!
//! A [`Node`] is split into two parts:
//! - static definition (task, argument slots, dependencies, explicit
//!   bindings) which is only mutated while the graph is being built;
//! - a shared [`NodeCell`] holding the per-run outcome, which is written
//!   exactly once by the node's own execution task.
//!
//! Cloning a node shares the cell, so clones observe the same run state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use crate::errors::WorkflowError;
use crate::exec::Task;
use crate::types::{Value, ValueKind};

/// Dense node identifier, assigned in creation order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run state of a node. Transitions only move forward:
/// `Pending -> Running -> {Completed, Errored}` or `Pending -> Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeState {
    Pending = 0,
    Running = 1,
    Completed = 2,
    Errored = 3,
}

impl NodeState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => NodeState::Pending,
            1 => NodeState::Running,
            2 => NodeState::Completed,
            _ => NodeState::Errored,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, NodeState::Completed | NodeState::Errored)
    }
}

/// One argument slot: either preset by the caller or left empty to be filled
/// from a dependency result.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Preset(Value),
    Empty(ValueKind),
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty(_))
    }

    /// Value passed to the task if nothing fills this slot.
    pub fn value_or_zero(&self) -> Value {
        match self {
            Slot::Preset(v) => v.clone(),
            Slot::Empty(kind) => kind.zero(),
        }
    }
}

/// Per-run outcome shared between a node's execution task and its readers.
pub(crate) struct NodeCell {
    state: AtomicU8,
    outcome: OnceLock<Result<Value, WorkflowError>>,
    bound_args: OnceLock<Vec<Value>>,
    done: watch::Sender<bool>,
}

impl NodeCell {
    fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self {
            state: AtomicU8::new(NodeState::Pending as u8),
            outcome: OnceLock::new(),
            bound_args: OnceLock::new(),
            done,
        }
    }

    pub(crate) fn state(&self) -> NodeState {
        NodeState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move forward to `next`. Returns `false` if that would regress.
    pub(crate) fn advance(&self, next: NodeState) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current >= next as u8 || NodeState::from_u8(current).is_terminal() {
                return false;
            }
            match self.state.compare_exchange(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn outcome(&self) -> Option<&Result<Value, WorkflowError>> {
        self.outcome.get()
    }

    /// Record the outcome and the matching terminal state. Write-once.
    pub(crate) fn finish(&self, outcome: Result<Value, WorkflowError>) -> bool {
        let next = if outcome.is_ok() {
            NodeState::Completed
        } else {
            NodeState::Errored
        };
        if self.outcome.set(outcome).is_err() {
            return false;
        }
        self.advance(next);
        true
    }

    pub(crate) fn set_bound_args(&self, args: Vec<Value>) {
        let _ = self.bound_args.set(args);
    }

    pub(crate) fn bound_args(&self) -> Option<&Vec<Value>> {
        self.bound_args.get()
    }

    /// Fire the completion signal. Must be called after `finish`.
    pub(crate) fn signal_done(&self) {
        self.done.send_replace(true);
    }

    pub(crate) fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// Wait until the node has signalled completion.
    pub(crate) async fn wait_done(&self) {
        let mut rx = self.done.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|done| *done).await;
    }
}

/// A graph vertex: one task, its argument slots, its dependencies, and its
/// outcome once the workflow has run.
#[derive(Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) task: Task,
    pub(crate) slots: Vec<Slot>,
    pub(crate) deps: Vec<NodeId>,
    /// Explicit slot -> dependency bindings; these win over kind matching.
    pub(crate) bindings: BTreeMap<usize, NodeId>,
    pub(crate) cell: Arc<NodeCell>,
}

impl Node {
    pub(crate) fn new(id: NodeId, task: Task, slots: Vec<Slot>) -> Self {
        Self {
            id,
            task,
            slots,
            deps: Vec::new(),
            bindings: BTreeMap::new(),
            cell: Arc::new(NodeCell::new()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn task_name(&self) -> &str {
        self.task.name()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Declared dependencies, in declaration order.
    pub fn dependencies(&self) -> &[NodeId] {
        &self.deps
    }

    pub fn bindings(&self) -> &BTreeMap<usize, NodeId> {
        &self.bindings
    }

    pub fn state(&self) -> NodeState {
        self.cell.state()
    }

    /// The value produced by a successful run.
    pub fn result(&self) -> Option<&Value> {
        self.cell.outcome().and_then(|o| o.as_ref().ok())
    }

    /// The error recorded for this node, if any.
    pub fn error(&self) -> Option<&WorkflowError> {
        self.cell.outcome().and_then(|o| o.as_ref().err())
    }

    /// Arguments as passed to the task, or the slot values if the task has
    /// not been invoked.
    pub fn arguments(&self) -> Vec<Value> {
        match self.cell.bound_args() {
            Some(args) => args.clone(),
            None => self.slots.iter().map(Slot::value_or_zero).collect(),
        }
    }

    /// Whether the completion signal has fired.
    pub fn is_done(&self) -> bool {
        self.cell.is_done()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("task", &self.task.name())
            .field("deps", &self.deps)
            .field("state", &self.state())
            .finish()
    }
}
