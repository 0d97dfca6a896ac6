// src/dag/toposort.rs

//! Depth-first topological ordering with cycle detection.
//!
//! Identity is the node id, never the node's address, so the result is the
//! same for any copy of the graph.

use std::collections::HashSet;

use tracing::debug;

use crate::dag::node::{Node, NodeId};
use crate::errors::WorkflowError;

/// Order `nodes` so that every dependency precedes its dependents.
///
/// `nodes` must be indexed by id (as held by [`crate::dag::Workflow`]).
/// Fails with `CycleDetected` naming the node whose dependency edge closes
/// the cycle; no partial order is returned.
pub fn topological_order(nodes: &[Node]) -> Result<Vec<NodeId>, WorkflowError> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(nodes.len());
    let mut in_progress: HashSet<NodeId> = HashSet::new();
    // Explicit DFS stack of (node, index of the next dependency to visit),
    // so graph depth is bounded by heap, not by the thread stack.
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for root in nodes {
        if !visited.insert(root.id) {
            continue;
        }
        in_progress.insert(root.id);
        stack.push((root.id, 0));

        while let Some((id, next)) = stack.last_mut() {
            let id = *id;
            match nodes[id.index()].deps.get(*next) {
                Some(&dep) => {
                    *next += 1;
                    if in_progress.contains(&dep) {
                        return Err(WorkflowError::CycleDetected { node: id });
                    }
                    if visited.insert(dep) {
                        in_progress.insert(dep);
                        stack.push((dep, 0));
                    }
                }
                None => {
                    stack.pop();
                    in_progress.remove(&id);
                    order.push(id);
                }
            }
        }
    }

    debug!(nodes = order.len(), "topological order computed");
    Ok(order)
}
