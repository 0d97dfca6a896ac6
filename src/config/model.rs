// src/config/model.rs

use serde::Deserialize;

use crate::types::{Value, ValueKind};

/// Pipeline description as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// concurrency = 2
/// precheck = true
///
/// [[node]]
/// name = "receive_ride_request"
/// message = "Received ride request"
/// sleep_ms = 1000
/// output = "RideRequestID"
///
/// [[node]]
/// name = "validate_user"
/// inputs = ["text"]
/// after = ["receive_ride_request"]
/// ```
///
/// Nodes are an array of tables so that file order becomes node id order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineFile {
    #[serde(default)]
    pub config: RunSection,

    #[serde(default)]
    pub node: Vec<NodeConfig>,
}

/// A validated pipeline. Only obtainable through `TryFrom<RawPipelineFile>`.
#[derive(Debug, Clone)]
pub struct PipelineFile {
    pub config: RunSection,
    pub node: Vec<NodeConfig>,
}

impl PipelineFile {
    pub(crate) fn new_unchecked(config: RunSection, node: Vec<NodeConfig>) -> Self {
        Self { config, node }
    }

    pub fn node_named(&self, name: &str) -> Option<&NodeConfig> {
        self.node.iter().find(|n| n.name == name)
    }
}

/// `[config]` section: run settings, overridable from the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Maximum number of node bodies executing at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Publish live graph snapshots while running.
    #[serde(default)]
    pub debug: bool,

    /// Sort the graph and reject cycles before launching anything.
    #[serde(default)]
    pub precheck: bool,
}

fn default_concurrency() -> usize {
    1
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            debug: false,
            precheck: false,
        }
    }
}

/// `[[node]]` entry: a simulated unit of work.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Unique name; also the node's label in graph output.
    pub name: String,

    /// Line logged when the node starts its work.
    #[serde(default)]
    pub message: Option<String>,

    /// Simulated work duration.
    #[serde(default)]
    pub sleep_ms: u64,

    /// Declared input kinds, one per argument slot.
    #[serde(default)]
    pub inputs: Vec<ValueKind>,

    /// Preset values for the leading argument slots.
    #[serde(default)]
    pub args: Vec<Value>,

    /// Value produced on success. Defaults to unit.
    #[serde(default)]
    pub output: Option<Value>,

    /// If set, the node fails with this message instead of producing output.
    #[serde(default)]
    pub fail: Option<String>,

    /// Names of the nodes this one depends on.
    #[serde(default)]
    pub after: Vec<String>,
}

impl NodeConfig {
    pub fn effective_output(&self) -> Value {
        self.output.clone().unwrap_or(Value::Unit)
    }
}
