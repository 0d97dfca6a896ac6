#![allow(dead_code)]

pub use flowdag_test_utils::builders;
pub use flowdag_test_utils::probe::{ConcurrencyProbe, Event, ExecutionLog, RecordingSink};
pub use flowdag_test_utils::tasks::TaskKit;
pub use flowdag_test_utils::{init_tracing, with_timeout};

use flowdag::dag::{NodeId, Workflow};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A ok, B and C after A, D after B and C. C fails.
pub struct Diamond {
    pub workflow: Workflow,
    pub kit: TaskKit,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub d: NodeId,
}

pub fn diamond_with_failing_c(limit: usize) -> Diamond {
    let kit = TaskKit::new();
    let mut workflow = Workflow::new(limit, false).unwrap();

    let a = workflow.create_node(kit.task("A", 10, "a"), []);
    let b = workflow.create_node(kit.task("B", 20, "b"), []);
    let c = workflow.create_node(kit.failing("C", 20, "C exploded"), []);
    let d = workflow.create_node(kit.task("D", 10, "d"), []);

    workflow.add_dependency(b, [a]).unwrap();
    workflow.add_dependency(c, [a]).unwrap();
    workflow.add_dependency(d, [b, c]).unwrap();

    Diamond {
        workflow,
        kit,
        a,
        b,
        c,
        d,
    }
}
