//! Error types for sync-bench shared types.

use thiserror::Error;

/// Errors produced while building or parsing shared types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// Node identity is empty or contains the record separator or a quote
    #[error("invalid node identity {0:?}")]
    InvalidIdentity(String),

    /// Log line does not start with a known event tag
    #[error("unknown event tag: {0}")]
    UnknownTag(String),

    /// Event record is missing a field
    #[error("malformed {tag} record: {line}")]
    MalformedRecord {
        /// Tag of the record being parsed.
        tag: &'static str,
        /// The offending line.
        line: String,
    },

    /// Sequence number field is not an unsigned integer
    #[error("invalid sequence number: {0}")]
    InvalidSeqNo(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TypeError::UnknownTag("SEND_SYNC_INT".into());
        assert_eq!(err.to_string(), "unknown event tag: SEND_SYNC_INT");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeError>();
    }
}
