//! Offline analysis of experiment logs.
//!
//! Matches every `RECV_MSG` against the `PUBL_MSG` with the same payload
//! and reports publish-to-receive latency and the delivery ratio:
//!
//! ```text
//! delivery_ratio = (receipts / (nodes - 1)) / publishes
//! ```
//!
//! A ratio of 1.0 means every published item reached every other node.

use bench_types::{EventRecord, NodeIdentity};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// An event record with the wall-clock time it was logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedRecord {
    /// Unix time in milliseconds.
    pub at_ms: u64,
    /// The parsed record.
    pub record: EventRecord,
}

/// Latency distribution in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    /// Number of samples.
    pub samples: usize,
    /// Fastest delivery.
    pub min_ms: i64,
    /// Slowest delivery.
    pub max_ms: i64,
    /// Arithmetic mean.
    pub mean_ms: f64,
    /// Median (mean of the two middle samples for even counts).
    pub median_ms: f64,
    /// 95th percentile, nearest rank.
    pub p95_ms: i64,
}

impl LatencyStats {
    /// Summarize `deltas`. Returns `None` when there are no samples.
    pub fn from_samples(mut deltas: Vec<i64>) -> Option<Self> {
        if deltas.is_empty() {
            return None;
        }
        deltas.sort_unstable();
        let n = deltas.len();
        let sum: i64 = deltas.iter().sum();
        let median_ms = if n % 2 == 1 {
            deltas[n / 2] as f64
        } else {
            (deltas[n / 2 - 1] + deltas[n / 2]) as f64 / 2.0
        };
        // Nearest rank: ceil(0.95 * n), 1-based.
        let rank = (n * 95).div_ceil(100).max(1);
        Some(Self {
            samples: n,
            min_ms: deltas[0],
            max_ms: deltas[n - 1],
            mean_ms: sum as f64 / n as f64,
            median_ms,
            p95_ms: deltas[rank - 1],
        })
    }
}

/// Result of analyzing one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Node count used for the delivery ratio.
    pub nodes: usize,
    /// Distinct nodes that published at least one item.
    pub publishing_nodes: usize,
    /// Items published.
    pub published: usize,
    /// `RECV_MSG` records matched to a publish.
    pub receipts: usize,
    /// `RECV_MSG` records whose payload was never published.
    pub unmatched_receipts: usize,
    /// `RECV_STATE` records seen.
    pub state_notifications: usize,
    /// Fraction of expected deliveries that happened.
    pub delivery_ratio: f64,
    /// Publish-to-receive latency.
    pub latency: Option<LatencyStats>,
}

/// Accumulates records from one or more node logs of the same run.
#[derive(Debug, Default)]
pub struct LogAnalyzer {
    published: HashMap<String, (NodeIdentity, u64)>,
    received: Vec<(String, u64)>,
    initialized: BTreeSet<NodeIdentity>,
    state_notifications: usize,
}

impl LogAnalyzer {
    /// Create an empty analyzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record.
    pub fn ingest(&mut self, timed: TimedRecord) {
        match timed.record {
            EventRecord::NodeInit { node } => {
                self.initialized.insert(node);
            }
            EventRecord::Published { node, message } => {
                self.published.insert(message, (node, timed.at_ms));
            }
            EventRecord::ReceivedState { .. } => self.state_notifications += 1,
            EventRecord::ReceivedMessage { content, .. } => {
                self.received.push((content, timed.at_ms));
            }
        }
    }

    /// Add many records.
    pub fn ingest_all(&mut self, records: impl IntoIterator<Item = TimedRecord>) {
        for record in records {
            self.ingest(record);
        }
    }

    /// Build the report.
    ///
    /// `nodes` overrides the node count; by default it is the number of
    /// distinct `NODE_INIT` records.
    pub fn report(&self, nodes: Option<usize>) -> AnalysisReport {
        let nodes = nodes.unwrap_or(self.initialized.len());

        let mut deltas = Vec::with_capacity(self.received.len());
        let mut unmatched_receipts = 0;
        for (content, at_ms) in &self.received {
            match self.published.get(content) {
                Some((_, published_at)) => deltas.push(*at_ms as i64 - *published_at as i64),
                None => unmatched_receipts += 1,
            }
        }

        let publishing_nodes = self
            .published
            .values()
            .map(|(node, _)| node)
            .collect::<BTreeSet<_>>()
            .len();

        let published = self.published.len();
        let receipts = deltas.len();
        let delivery_ratio = if nodes > 1 && published > 0 {
            (receipts as f64 / (nodes - 1) as f64) / published as f64
        } else {
            0.0
        };

        AnalysisReport {
            nodes,
            publishing_nodes,
            published,
            receipts,
            unmatched_receipts,
            state_notifications: self.state_notifications,
            delivery_ratio,
            latency: LatencyStats::from_samples(deltas),
        }
    }
}
