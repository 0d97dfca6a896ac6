// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::Result;

/// Load a pipeline file and return the raw, unvalidated `RawPipelineFile`.
///
/// Use [`load_and_validate`] unless you specifically want to skip the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Parse pipeline TOML from a string.
pub fn parse_str(contents: &str) -> Result<RawPipelineFile> {
    let raw: RawPipelineFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a pipeline file and validate it:
///
/// - at least one node, unique names,
/// - `[config].concurrency >= 1`,
/// - known `after` targets, no self-dependency,
/// - preset `args` consistent with `inputs`,
/// - no cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let raw = load_from_path(&path)?;
    let pipeline = PipelineFile::try_from(raw)?;
    Ok(pipeline)
}
