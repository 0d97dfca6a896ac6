// src/exec/sink.rs

//! Pluggable destinations for graph snapshots.
//!
//! The scheduler only talks to an [`ExportSink`] and only in debug mode.
//! Sink errors are logged by the scheduler and never change a run's outcome.
//!
//! - [`LogSink`] emits the DOT text through `tracing` (the default).
//! - [`DotFileSink`] writes a `.dot` file and can render it to an image with
//!   the external Graphviz `dot` tool.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::debug;

/// Receives a complete graph description each time the scheduler publishes.
pub trait ExportSink: Send + Sync {
    fn publish(&self, dot: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Sink that logs each snapshot at `debug` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ExportSink for LogSink {
    fn publish(&self, dot: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            debug!(graph = %dot, "graph snapshot");
            Ok(())
        })
    }
}

/// Image rendering settings for [`DotFileSink`].
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub output: PathBuf,
    /// Graphviz output format, e.g. `png` or `svg`.
    pub format: String,
}

/// Sink that overwrites a `.dot` file on every snapshot, optionally followed
/// by an image render.
#[derive(Debug, Clone)]
pub struct DotFileSink {
    path: PathBuf,
    render: Option<RenderTarget>,
}

impl DotFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            render: None,
        }
    }

    pub fn with_render(mut self, output: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        self.render = Some(RenderTarget {
            output: output.into(),
            format: format.into(),
        });
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for DotFileSink {
    fn publish(&self, dot: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            tokio::fs::write(&self.path, dot)
                .await
                .with_context(|| format!("writing graph description to {:?}", self.path))?;

            if let Some(target) = &self.render {
                render_image(&self.path, &target.output, &target.format).await?;
            }
            Ok(())
        })
    }
}

/// Run `dot -T<format> <dot_path> -o <output>`.
pub async fn render_image(dot_path: &Path, output: &Path, format: &str) -> Result<()> {
    let status = Command::new("dot")
        .arg(format!("-T{format}"))
        .arg(dot_path)
        .arg("-o")
        .arg(output)
        .kill_on_drop(true)
        .status()
        .await
        .with_context(|| format!("spawning `dot` to render {:?}", dot_path))?;

    if !status.success() {
        bail!(
            "`dot` exited with {} while rendering {:?}",
            status.code().map_or_else(|| "a signal".to_string(), |c| format!("code {c}")),
            output
        );
    }

    debug!(output = ?output, "graph image rendered");
    Ok(())
}
