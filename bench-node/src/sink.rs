//! Where event records go.
//!
//! The harness reports what it observed as [`EventRecord`]s. In production
//! they become `tracing` events under [`EVENT_TARGET`], which the CLI's
//! subscriber writes to the experiment log file. Tests collect them in a
//! [`MemorySink`].

use bench_types::EventRecord;
use parking_lot::Mutex;
use std::sync::Arc;

/// Tracing target for event records.
pub const EVENT_TARGET: &str = "sync_bench::event";

/// Receives the node's event records in the order they happen.
pub trait ObservationSink {
    /// Record one event.
    fn record(&mut self, record: &EventRecord);
}

/// Emits every record as an `info` event under [`EVENT_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservationSink for TracingSink {
    fn record(&mut self, record: &EventRecord) {
        tracing::info!(target: EVENT_TARGET, "{record}");
    }
}

/// Collects records in memory.
///
/// Clones share the buffer, so a test keeps one clone for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    /// Records rendered as log lines.
    pub fn lines(&self) -> Vec<String> {
        let records = self.records.lock();
        records.iter().map(ToString::to_string).collect()
    }
}

impl ObservationSink for MemorySink {
    fn record(&mut self, record: &EventRecord) {
        self.records.lock().push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_types::NodeIdentity;

    #[test]
    fn memory_sink_clones_share_records() {
        let shared = MemorySink::new();
        let mut sink = shared.clone();
        let node = NodeIdentity::new("a").unwrap();

        sink.record(&EventRecord::NodeInit { node: node.clone() });
        sink.record(&EventRecord::Published {
            node,
            message: "a=1".into(),
        });

        assert_eq!(shared.lines(), vec!["NODE_INIT::a", "PUBL_MSG::a::a=1"]);
    }
}
