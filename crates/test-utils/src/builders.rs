#![allow(dead_code)]

use flowdag::config::{NodeConfig, PipelineFile, RawPipelineFile, RunSection};
use flowdag::types::{Value, ValueKind};

/// Builder for `PipelineFile` to simplify test setup.
pub struct PipelineBuilder {
    pipeline: RawPipelineFile,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            pipeline: RawPipelineFile {
                config: RunSection::default(),
                node: Vec::new(),
            },
        }
    }

    pub fn with_node(mut self, node: NodeConfig) -> Self {
        self.pipeline.node.push(node);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.pipeline.config.concurrency = concurrency;
        self
    }

    pub fn with_precheck(mut self, precheck: bool) -> Self {
        self.pipeline.config.precheck = precheck;
        self
    }

    /// The unvalidated form, for exercising validation errors.
    pub fn build_raw(self) -> RawPipelineFile {
        self.pipeline
    }

    pub fn build(self) -> PipelineFile {
        PipelineFile::try_from(self.pipeline).expect("Failed to build valid pipeline from builder")
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `NodeConfig`.
pub struct NodeConfigBuilder {
    node: NodeConfig,
}

impl NodeConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            node: NodeConfig {
                name: name.to_string(),
                message: None,
                sleep_ms: 0,
                inputs: Vec::new(),
                args: Vec::new(),
                output: None,
                fail: None,
                after: Vec::new(),
            },
        }
    }

    pub fn message(mut self, message: &str) -> Self {
        self.node.message = Some(message.to_string());
        self
    }

    pub fn sleep_ms(mut self, ms: u64) -> Self {
        self.node.sleep_ms = ms;
        self
    }

    pub fn inputs(mut self, kinds: &[ValueKind]) -> Self {
        self.node.inputs = kinds.to_vec();
        self
    }

    pub fn args(mut self, args: Vec<Value>) -> Self {
        self.node.args = args;
        self
    }

    pub fn output(mut self, value: impl Into<Value>) -> Self {
        self.node.output = Some(value.into());
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.node.fail = Some(message.to_string());
        self
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.node.after = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(self) -> NodeConfig {
        self.node
    }
}
