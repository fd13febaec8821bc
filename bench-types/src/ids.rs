//! Identity and ordering types for sync-bench.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypeError;
use crate::record::FIELD_SEPARATOR;

/// The publishing namespace of this node.
///
/// Immutable for the process lifetime. Never empty and never contains the
/// record separator or a double quote, so it can be embedded in quoted log
/// lines unambiguously.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Create a node identity, rejecting blank names and names containing `::` or `"`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() || name.contains(FIELD_SEPARATOR) || name.contains('"') {
            return Err(TypeError::InvalidIdentity(name));
        }
        Ok(Self(name))
    }

    /// Get the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The session name peers will see for items this node publishes.
    pub fn session(&self) -> RemoteSession {
        RemoteSession::new(self.0.clone())
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIdentity({})", self.0)
    }
}

/// A peer's publishing namespace as known to the sync engine.
///
/// Opaque to the harness; only compared, hashed and printed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemoteSession(String);

impl RemoteSession {
    /// Wrap an engine-supplied session name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the session name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoteSession({})", self.0)
    }
}

/// Per-session sequence number. The first item a session publishes is 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct SeqNo(u64);

impl SeqNo {
    /// Create a sequence number with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The following sequence number, saturating at `u64::MAX`.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SeqNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SeqNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqNo({})", self.0)
    }
}

impl std::str::FromStr for SeqNo {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidSeqNo(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rejects_blank() {
        assert!(NodeIdentity::new("").is_err());
        assert!(NodeIdentity::new("   ").is_err());
    }

    #[test]
    fn identity_rejects_separator() {
        let err = NodeIdentity::new("a::b").unwrap_err();
        assert_eq!(err, TypeError::InvalidIdentity("a::b".into()));
    }

    #[test]
    fn identity_rejects_quote() {
        let err = NodeIdentity::new(r#"node", "x"#).unwrap_err();
        assert_eq!(err, TypeError::InvalidIdentity(r#"node", "x"#.into()));
        assert!(NodeIdentity::new("node\"").is_err());
    }

    #[test]
    fn identity_keeps_slashes() {
        let id = NodeIdentity::new("/ndn/a-site/a").unwrap();
        assert_eq!(id.as_str(), "/ndn/a-site/a");
        assert_eq!(id.session().as_str(), "/ndn/a-site/a");
    }

    #[test]
    fn seq_no_parses_and_orders() {
        let a: SeqNo = "10".parse().unwrap();
        let b = a.next();
        assert!(a < b);
        assert_eq!(b.value(), 11);
        assert!("ten".parse::<SeqNo>().is_err());
    }

    #[test]
    fn seq_no_next_saturates() {
        assert_eq!(SeqNo::new(u64::MAX).next().value(), u64::MAX);
    }

    #[test]
    fn session_serializes_as_plain_string() {
        let json = serde_json::to_string(&RemoteSession::new("peer-1")).unwrap();
        assert_eq!(json, "\"peer-1\"");
    }
}
