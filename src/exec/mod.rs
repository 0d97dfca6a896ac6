// src/exec/mod.rs

//! Execution layer.
//!
//! - [`task`] defines the typed task contract nodes wrap.
//! - [`binder`] fills empty argument slots from dependency results.
//! - [`scheduler`] runs a workflow: one Tokio task per node, a shared
//!   semaphore for admission control, first-error reporting.
//! - [`sink`] provides the [`ExportSink`] trait used for live graph
//!   snapshots in debug mode, with log and file implementations.

pub(crate) mod binder;
pub mod scheduler;
pub mod sink;
pub mod task;

pub use scheduler::RunReport;
pub use sink::{DotFileSink, ExportSink, LogSink, RenderTarget, render_image};
pub use task::{CallShapeError, Task, TaskFuture};
