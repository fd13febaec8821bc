//! Expansion of missing-range notifications into fetch requests.
//!
//! Ranges are visited in the order received and each range ascending. The
//! plan is lazy so a wide range never materializes as a list.

use bench_types::{MissingRange, RemoteSession, SeqNo};

/// One `(session, seq)` the reconciler should fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    /// Peer session to fetch from.
    pub session: RemoteSession,
    /// Sequence number to fetch.
    pub seq: SeqNo,
}

/// Fetch requests for every sequence number in `ranges`.
pub fn fetch_plan(ranges: &[MissingRange]) -> impl Iterator<Item = FetchRequest> + '_ {
    ranges.iter().flat_map(|range| {
        range.seqs().map(move |seq| FetchRequest {
            session: range.session.clone(),
            seq,
        })
    })
}
