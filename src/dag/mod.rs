// src/dag/mod.rs

//! Workflow graph.
//!
//! - [`node`] holds the node data model and its run state.
//! - [`workflow`] is the graph builder and the entry point for running.
//! - [`toposort`] orders nodes dependencies-first and detects cycles.
//! - [`export`] renders the graph and node states as DOT text.

pub mod export;
pub mod node;
pub mod toposort;
pub mod workflow;

pub use export::to_dot;
pub use node::{Node, NodeId, NodeState, Slot};
pub use toposort::topological_order;
pub use workflow::Workflow;
