// src/errors.rs

//! Crate-wide error types.
//!
//! - [`WorkflowError`] is what the engine attaches to nodes and returns from
//!   [`crate::dag::Workflow::run`]. It is `Clone` so that a dependency's error
//!   can be shared by every blocked dependent.
//! - [`FlowdagError`] covers everything around the engine: pipeline files,
//!   IO, and the driver.

use std::sync::Arc;

use thiserror::Error;

use crate::dag::NodeId;

/// Errors produced while building or running a workflow.
#[derive(Error, Debug, Clone)]
pub enum WorkflowError {
    /// Construction-time misconfiguration.
    #[error("invalid workflow configuration: {0}")]
    InvalidConfig(String),

    /// The dependency relation contains a cycle.
    #[error("circular dependency detected involving node {node}")]
    CycleDetected { node: NodeId },

    /// The node's task reported a failure.
    #[error("node {node} ({task}) failed: {message}")]
    TaskFailure {
        node: NodeId,
        task: String,
        message: String,
    },

    /// The task invocation faulted (bad call shape or panic).
    #[error("node {node} ({task}) faulted: {message}")]
    RuntimeFault {
        node: NodeId,
        task: String,
        message: String,
    },

    /// The node never ran because a dependency carries an error.
    #[error("node {node} blocked by dependency error from node {dependency}: {source}")]
    BlockedByDependency {
        node: NodeId,
        dependency: NodeId,
        #[source]
        source: Arc<WorkflowError>,
    },
}

impl WorkflowError {
    /// Node this error is attached to, if it is a node-level error.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            WorkflowError::InvalidConfig(_) | WorkflowError::CycleDetected { .. } => None,
            WorkflowError::TaskFailure { node, .. }
            | WorkflowError::RuntimeFault { node, .. }
            | WorkflowError::BlockedByDependency { node, .. } => Some(*node),
        }
    }

    /// Follow a `BlockedByDependency` chain back to the originating failure.
    pub fn root_cause(&self) -> &WorkflowError {
        let mut current = self;
        while let WorkflowError::BlockedByDependency { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// Whether this error means the node never executed its task body.
    pub fn is_blocked(&self) -> bool {
        matches!(self, WorkflowError::BlockedByDependency { .. })
    }
}

#[derive(Error, Debug)]
pub enum FlowdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cycle detected in pipeline: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlowdagError>;
