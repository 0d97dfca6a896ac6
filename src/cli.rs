// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `flowdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "flowdag",
    version,
    about = "Run a DAG of simulated tasks concurrently, respecting dependencies.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Flowdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Flowdag.toml")]
    pub pipeline: String,

    /// Maximum number of tasks running at once. Overrides `[config].concurrency`.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Publish live graph snapshots to `--dot-out` while running.
    #[arg(long)]
    pub debug: bool,

    /// Topologically sort before running and reject cycles.
    #[arg(long)]
    pub precheck: bool,

    /// Where the final graph description (DOT) is written.
    #[arg(long, value_name = "PATH", default_value = "workflow.dot")]
    pub dot_out: String,

    /// Render the final graph to this image path with Graphviz `dot`.
    #[arg(long, value_name = "PATH")]
    pub render: Option<String>,

    /// Image format passed to `dot -T`.
    #[arg(long, value_name = "FORMAT", default_value = "png")]
    pub format: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLOWDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the graph, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
