//! Ready-made tasks that report to a shared [`ExecutionLog`] and
//! [`ConcurrencyProbe`].

use std::sync::Arc;
use std::time::Duration;

use flowdag::exec::Task;
use flowdag::types::{Value, ValueKind};

use crate::probe::{ConcurrencyProbe, ExecutionLog};

#[derive(Clone)]
pub struct TaskKit {
    pub log: Arc<ExecutionLog>,
    pub probe: Arc<ConcurrencyProbe>,
}

impl TaskKit {
    pub fn new() -> Self {
        Self {
            log: ExecutionLog::new(),
            probe: ConcurrencyProbe::new(),
        }
    }

    /// Sleeps for `delay_ms` and returns `output`; takes no inputs.
    pub fn task(&self, name: &str, delay_ms: u64, output: impl Into<Value>) -> Task {
        self.task_with_inputs(name, &[], delay_ms, output)
    }

    pub fn task_with_inputs(
        &self,
        name: &str,
        inputs: &[ValueKind],
        delay_ms: u64,
        output: impl Into<Value>,
    ) -> Task {
        let kit = self.clone();
        let label = name.to_string();
        let output = output.into();
        Task::infallible(name, inputs.to_vec(), move |_args| {
            let (kit, label, output) = (kit.clone(), label.clone(), output.clone());
            async move {
                kit.log.start(&label);
                let _guard = kit.probe.enter();
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                kit.log.finish(&label);
                output
            }
        })
    }

    /// Sleeps for `delay_ms` and fails with `message`.
    pub fn failing(&self, name: &str, delay_ms: u64, message: &str) -> Task {
        let kit = self.clone();
        let label = name.to_string();
        let message = message.to_string();
        Task::fallible(name, Vec::new(), move |_args| {
            let (kit, label, message) = (kit.clone(), label.clone(), message.clone());
            async move {
                kit.log.start(&label);
                let _guard = kit.probe.enter();
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                kit.log.finish(&label);
                Err(anyhow::anyhow!(message))
            }
        })
    }

    /// Panics as soon as the body runs.
    pub fn panicking(&self, name: &str, message: &'static str) -> Task {
        let kit = self.clone();
        let label = name.to_string();
        Task::infallible(name, Vec::new(), move |_args| {
            let (kit, label) = (kit.clone(), label.clone());
            async move {
                kit.log.start(&label);
                explode(message)
            }
        })
    }
}

fn explode(message: &str) -> Value {
    panic!("{message}")
}

impl Default for TaskKit {
    fn default() -> Self {
        Self::new()
    }
}
