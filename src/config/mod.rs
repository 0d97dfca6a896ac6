// src/config/mod.rs

//! Pipeline files for the `flowdag` driver.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a pipeline file from disk (`loader.rs`).
//! - Validate names, arguments and DAG correctness (`validate.rs`).
//! - Build a [`crate::dag::Workflow`] of simulated tasks (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::build_workflow;
pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{NodeConfig, PipelineFile, RawPipelineFile, RunSection};
