// src/lib.rs

//! `flowdag`: run a directed acyclic graph of typed tasks concurrently.
//!
//! Library users build a [`dag::Workflow`] from [`exec::Task`]s, declare
//! dependencies and call [`dag::Workflow::run`]. The `flowdag` binary wraps
//! the same engine around a TOML pipeline description (see [`config`]).

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::build_workflow;
use crate::config::loader::load_and_validate;
use crate::config::model::{PipelineFile, RunSection};
use crate::dag::Workflow;
use crate::exec::{DotFileSink, RunReport, render_image};

pub use crate::dag::{Node, NodeId, NodeState};
pub use crate::errors::{FlowdagError, WorkflowError};
pub use crate::exec::{ExportSink, Task};
pub use crate::types::{Value, ValueKind};

/// Run settings after applying CLI overrides to `[config]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub concurrency: usize,
    pub debug: bool,
    pub precheck: bool,
}

impl RunSettings {
    /// CLI flags win; boolean flags can only switch a setting on.
    pub fn resolve(config: &RunSection, args: &CliArgs) -> Self {
        Self {
            concurrency: args.concurrency.unwrap_or(config.concurrency),
            debug: args.debug || config.debug,
            precheck: args.precheck || config.precheck,
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline loading + validation
/// - workflow construction
/// - the run itself (with live snapshots in debug mode)
/// - final DOT output and optional image rendering
pub async fn run(args: CliArgs) -> Result<()> {
    let pipeline_path = PathBuf::from(&args.pipeline);
    let pipeline = load_and_validate(&pipeline_path)
        .with_context(|| format!("loading pipeline {:?}", pipeline_path))?;
    let settings = RunSettings::resolve(&pipeline.config, &args);

    if args.dry_run {
        print_dry_run(&pipeline, &settings);
        return Ok(());
    }

    let dot_out = PathBuf::from(&args.dot_out);
    let mut workflow = build_workflow(&pipeline, settings.concurrency, settings.debug)?;
    if settings.debug {
        workflow.set_sink(Arc::new(DotFileSink::new(&dot_out)));
    }

    info!(
        pipeline = ?pipeline_path,
        nodes = workflow.len(),
        concurrency = settings.concurrency,
        precheck = settings.precheck,
        debug = settings.debug,
        "starting pipeline"
    );

    let report = workflow.run_collecting(settings.precheck).await?;

    write_final_graph(&workflow, &dot_out).await?;
    if let Some(image) = &args.render {
        if let Err(e) = render_image(&dot_out, Path::new(image), &args.format).await {
            let message = format!("{e:#}");
            warn!(error = %message, image = %image, "graph image could not be rendered");
        }
    }

    print_summary(&workflow, &report);
    report.into_result()?;
    Ok(())
}

async fn write_final_graph(workflow: &Workflow, dot_out: &Path) -> Result<()> {
    tokio::fs::write(dot_out, workflow.to_dot())
        .await
        .with_context(|| format!("writing graph description to {:?}", dot_out))?;
    debug!(path = ?dot_out, "final graph description written");
    Ok(())
}

/// Per-node outcome table on stdout.
fn print_summary(workflow: &Workflow, report: &RunReport) {
    println!("flowdag run: {} of {} nodes completed", report.completed, workflow.len());
    for node in workflow.nodes() {
        match (node.result(), node.error()) {
            (Some(value), _) => println!("  [ok]     {} -> {}", node.task_name(), value),
            (None, Some(err)) => println!("  [failed] {}: {}", node.task_name(), err),
            (None, None) => println!("  [?]      {}", node.task_name()),
        }
    }
}

/// Simple dry-run output: print settings, nodes and edges.
fn print_dry_run(pipeline: &PipelineFile, settings: &RunSettings) {
    println!("flowdag dry-run");
    println!("  concurrency = {}", settings.concurrency);
    println!("  precheck = {}", settings.precheck);
    println!("  debug = {}", settings.debug);
    println!();

    println!("nodes ({}):", pipeline.node.len());
    for (id, node) in pipeline.node.iter().enumerate() {
        println!("  {id}: {}", node.name);
        if !node.inputs.is_empty() {
            let kinds: Vec<&str> = node.inputs.iter().map(|k| k.as_str()).collect();
            println!("      inputs: [{}]", kinds.join(", "));
        }
        if !node.args.is_empty() {
            println!("      args: {:?}", node.args);
        }
        if !node.after.is_empty() {
            println!("      after: {:?}", node.after);
        }
        if let Some(reason) = &node.fail {
            println!("      fails with: {reason}");
        }
    }

    debug!("dry-run complete (no execution)");
}
