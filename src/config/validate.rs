// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::{FlowdagError, Result};

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = FlowdagError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_pipeline(&raw)?;
        Ok(PipelineFile::new_unchecked(raw.config, raw.node))
    }
}

fn validate_raw_pipeline(cfg: &RawPipelineFile) -> Result<()> {
    ensure_has_nodes(cfg)?;
    validate_run_section(cfg)?;
    validate_node_names(cfg)?;
    validate_node_arguments(cfg)?;
    validate_node_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_nodes(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.node.is_empty() {
        return Err(FlowdagError::ConfigError(
            "pipeline must contain at least one [[node]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_run_section(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.config.concurrency == 0 {
        return Err(FlowdagError::ConfigError(
            "[config].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_node_names(cfg: &RawPipelineFile) -> Result<()> {
    let mut seen = HashSet::new();
    for node in &cfg.node {
        if node.name.trim().is_empty() {
            return Err(FlowdagError::ConfigError(
                "node names must not be empty".to_string(),
            ));
        }
        if !seen.insert(node.name.as_str()) {
            return Err(FlowdagError::ConfigError(format!(
                "duplicate node name '{}'",
                node.name
            )));
        }
    }
    Ok(())
}

fn validate_node_arguments(cfg: &RawPipelineFile) -> Result<()> {
    for node in &cfg.node {
        if node.args.len() > node.inputs.len() {
            return Err(FlowdagError::ConfigError(format!(
                "node '{}' presets {} args but declares only {} inputs",
                node.name,
                node.args.len(),
                node.inputs.len()
            )));
        }
        for (slot, (arg, kind)) in node.args.iter().zip(node.inputs.iter()).enumerate() {
            if arg.kind() != *kind {
                return Err(FlowdagError::ConfigError(format!(
                    "node '{}' arg {} is {} but input {} is declared {}",
                    node.name,
                    slot,
                    arg.kind(),
                    slot,
                    kind
                )));
            }
        }
    }
    Ok(())
}

fn validate_node_dependencies(cfg: &RawPipelineFile) -> Result<()> {
    let names: HashSet<&str> = cfg.node.iter().map(|n| n.name.as_str()).collect();
    for node in &cfg.node {
        for dep in &node.after {
            if !names.contains(dep.as_str()) {
                return Err(FlowdagError::ConfigError(format!(
                    "node '{}' has unknown dependency '{}' in `after`",
                    node.name, dep
                )));
            }
            if *dep == node.name {
                return Err(FlowdagError::ConfigError(format!(
                    "node '{}' cannot depend on itself in `after`",
                    node.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawPipelineFile) -> Result<()> {
    // Edge direction: dep -> node.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for node in &cfg.node {
        graph.add_node(node.name.as_str());
    }

    for node in &cfg.node {
        for dep in &node.after {
            graph.add_edge(dep.as_str(), node.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(FlowdagError::DagCycle(format!(
            "cycle detected in pipeline involving node '{}'",
            cycle.node_id()
        ))),
    }
}
