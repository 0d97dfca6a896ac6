// src/dag/export.rs

//! Graphviz (DOT) rendering of a workflow.
//!
//! Output is a pure function of node order, edges and current node states,
//! so two calls with no state change in between are byte-identical. Each
//! node's state is read atomically; the snapshot as a whole is not.

use std::fmt::Write;

use crate::dag::node::{Node, NodeState};

/// Fill colour for a node state.
pub fn state_color(state: NodeState) -> &'static str {
    match state {
        NodeState::Pending => "gray",
        NodeState::Running => "green",
        NodeState::Completed => "blue",
        NodeState::Errored => "red",
    }
}

/// Render `nodes` as a `digraph`: node statements first, then one edge per
/// dependency -> dependent pair, both in node order.
pub fn to_dot(nodes: &[Node]) -> String {
    let mut dot = String::from("digraph G {\n");

    for node in nodes {
        let _ = writeln!(
            dot,
            "    node{} [label=\"{}\", color={}, style=filled];",
            node.id,
            escape_label(node.task_name()),
            state_color(node.state())
        );
    }

    for node in nodes {
        for dep in &node.deps {
            let _ = writeln!(dot, "    node{} -> node{};", dep, node.id);
        }
    }

    dot.push('}');
    dot
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
