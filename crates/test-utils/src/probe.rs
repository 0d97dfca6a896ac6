//! Observation helpers: how many task bodies overlap, in what order they
//! start and finish, and which graph snapshots a sink received.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use flowdag::exec::ExportSink;

/// Counts task bodies currently inside [`ConcurrencyProbe::enter`] and the
/// highest value that count ever reached.
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enter(self: &Arc<Self>) -> ProbeGuard {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ProbeGuard {
            probe: Arc::clone(self),
        }
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Leaves the probe on drop.
pub struct ProbeGuard {
    probe: Arc<ConcurrencyProbe>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.probe.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

/// Append-only record of task body start/finish events.
#[derive(Debug, Default)]
pub struct ExecutionLog {
    events: Mutex<Vec<Event>>,
}

impl ExecutionLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn start(&self, name: &str) {
        self.events.lock().unwrap().push(Event::Started(name.to_string()));
    }

    pub fn finish(&self, name: &str) {
        self.events.lock().unwrap().push(Event::Finished(name.to_string()));
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Names of tasks whose body started, in start order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                Event::Finished(_) => None,
            })
            .collect()
    }

    pub fn has_started(&self, name: &str) -> bool {
        self.started().iter().any(|n| n == name)
    }

    fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// True when `first` finished before `second` started.
    pub fn finished_before_started(&self, first: &str, second: &str) -> bool {
        match (
            self.position(&Event::Finished(first.to_string())),
            self.position(&Event::Started(second.to_string())),
        ) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }
}

/// Sink that keeps every snapshot it receives. A failing sink records the
/// snapshot and then returns an error.
#[derive(Debug, Default)]
pub struct RecordingSink {
    snapshots: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            snapshots: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn snapshots(&self) -> Vec<String> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.snapshots.lock().unwrap().last().cloned()
    }
}

impl ExportSink for RecordingSink {
    fn publish(&self, dot: String) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.snapshots.lock().unwrap().push(dot);
            if self.fail {
                anyhow::bail!("recording sink configured to fail");
            }
            Ok(())
        })
    }
}
