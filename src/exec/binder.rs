// src/exec/binder.rs

//! Fills empty argument slots from dependency results.
//!
//! For each empty slot, in order:
//! 1. an explicit binding (see [`crate::dag::Workflow::bind_input`]) supplies
//!    the bound dependency's result;
//! 2. otherwise the first dependency, in declaration order, whose result kind
//!    equals the slot's declared kind supplies its result;
//! 3. otherwise the slot keeps its zero value.
//!
//! Preset slots are passed through untouched.

use tracing::debug;

use crate::dag::{Node, Slot};
use crate::types::Value;

/// Build the argument list for `node`. Every dependency must already have
/// completed successfully.
pub(crate) fn bind_arguments(node: &Node, nodes: &[Node]) -> Vec<Value> {
    node.slots
        .iter()
        .enumerate()
        .map(|(slot, arg)| match arg {
            Slot::Preset(value) => value.clone(),
            Slot::Empty(kind) => {
                if let Some(&dep) = node.bindings.get(&slot) {
                    if let Some(value) = nodes[dep.index()].result() {
                        debug!(node = %node.id, slot, dependency = %dep, "bound argument explicitly");
                        return value.clone();
                    }
                }

                node.deps
                    .iter()
                    .find_map(|&dep| {
                        nodes[dep.index()]
                            .result()
                            .filter(|value| value.kind() == *kind)
                            .map(|value| (dep, value))
                    })
                    .map(|(dep, value)| {
                        debug!(node = %node.id, slot, dependency = %dep, kind = %kind, "bound argument by kind");
                        value.clone()
                    })
                    .unwrap_or_else(|| kind.zero())
            }
        })
        .collect()
}
