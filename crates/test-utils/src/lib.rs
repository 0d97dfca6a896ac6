//! Shared helpers for `flowdag` integration tests.
//!
//! - [`tasks::TaskKit`] builds tasks that report into an execution log and a
//!   concurrency probe.
//! - [`probe`] holds those observers plus a recording export sink.
//! - [`builders`] assembles pipeline descriptions without TOML.

pub mod builders;
pub mod probe;
pub mod tasks;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

pub use probe::{ConcurrencyProbe, ExecutionLog, RecordingSink};
pub use tasks::TaskKit;

static INIT: Once = Once::new();

/// Upper bound for a single workflow run in tests.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialise tracing for tests.
///
/// Output goes through `with_test_writer()`, so it only shows for failing
/// tests unless run with `-- --nocapture`. Filter with `RUST_LOG`, e.g.
/// `RUST_LOG=flowdag=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`RUN_TIMEOUT`].
///
/// A workflow with a cycle and no precheck never finishes, so every run in
/// the test suite goes through here.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(RUN_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("workflow run did not finish within {RUN_TIMEOUT:?}"))
}
