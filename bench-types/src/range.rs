//! Missing-range notifications produced by the sync engine.

use serde::{Deserialize, Serialize};

use crate::ids::{RemoteSession, SeqNo};

/// A contiguous inclusive run of sequence numbers a peer has published
/// that this node has not observed yet.
///
/// Consumed once by the update reconciler and then dropped; the harness
/// keeps no backlog of ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRange {
    /// The peer session the sequence numbers belong to.
    pub session: RemoteSession,
    /// First missing sequence number (inclusive).
    pub low: SeqNo,
    /// Last missing sequence number (inclusive).
    pub high: SeqNo,
}

impl MissingRange {
    /// Create a new range.
    pub fn new(session: RemoteSession, low: SeqNo, high: SeqNo) -> Self {
        Self { session, low, high }
    }

    /// Sequence numbers in the range, ascending.
    ///
    /// An inverted range (`low > high`) yields nothing.
    pub fn seqs(&self) -> impl Iterator<Item = SeqNo> {
        (self.low.value()..=self.high.value()).map(SeqNo::new)
    }

    /// Number of sequence numbers covered.
    pub fn len(&self) -> u64 {
        if self.low > self.high {
            0
        } else {
            (self.high.value() - self.low.value()).saturating_add(1)
        }
    }

    /// True when the range covers no sequence numbers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
