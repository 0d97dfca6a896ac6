// src/config/build.rs

//! Turn a validated [`PipelineFile`] into a runnable [`Workflow`].
//!
//! Each `[[node]]` becomes a simulated task: it logs its message, sleeps for
//! `sleep_ms`, then either returns `output` or fails with `fail`. Nodes
//! without `fail` use the infallible task shape.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::anyhow;
use tracing::info;

use crate::config::model::{NodeConfig, PipelineFile};
use crate::dag::{NodeId, Workflow};
use crate::errors::Result;
use crate::exec::Task;

/// Build a workflow for `pipeline`. Node ids follow file order.
pub fn build_workflow(pipeline: &PipelineFile, concurrency: usize, debug: bool) -> Result<Workflow> {
    let mut workflow = Workflow::new(concurrency, debug)?;
    let mut ids: HashMap<&str, NodeId> = HashMap::new();

    for node in &pipeline.node {
        let id = workflow.create_node(simulated_task(node), node.args.iter().cloned());
        ids.insert(node.name.as_str(), id);
    }

    for node in &pipeline.node {
        let deps = node.after.iter().filter_map(|dep| ids.get(dep.as_str()).copied());
        workflow.add_dependency(ids[node.name.as_str()], deps)?;
    }

    Ok(workflow)
}

fn simulated_task(node: &NodeConfig) -> Task {
    let name = node.name.clone();
    let message = node.message.clone().unwrap_or_else(|| format!("running {}", node.name));
    let delay = Duration::from_millis(node.sleep_ms);
    let output = node.effective_output();

    match node.fail.clone() {
        None => Task::infallible(node.name.clone(), node.inputs.clone(), move |args| {
            let (name, message, output) = (name.clone(), message.clone(), output.clone());
            async move {
                info!(task = %name, args = ?args, "{}", message);
                tokio::time::sleep(delay).await;
                output
            }
        }),
        Some(reason) => Task::fallible(node.name.clone(), node.inputs.clone(), move |args| {
            let (name, message, reason) = (name.clone(), message.clone(), reason.clone());
            async move {
                info!(task = %name, args = ?args, "{}", message);
                tokio::time::sleep(delay).await;
                Err(anyhow!(reason))
            }
        }),
    }
}
