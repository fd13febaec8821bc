//! Event records written to the experiment log.
//!
//! Each record renders as a single `EVENT_TAG::field::field` line. The
//! analysis tooling parses the same lines back, so `Display` and `FromStr`
//! must stay in agreement.

use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;
use crate::ids::{NodeIdentity, RemoteSession, SeqNo};

/// Separator between the tag and the fields of a record.
pub const FIELD_SEPARATOR: &str = "::";

/// Event tags understood by the log tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    /// The node finished setup and entered its reactor.
    NodeInit,
    /// The node handed a new item to the sync engine.
    Published,
    /// The sync engine reported a remote sequence number as missing.
    ReceivedState,
    /// Content for a remote sequence number was fetched.
    ReceivedMessage,
}

impl EventTag {
    /// The tag as it appears at the start of a log line.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::NodeInit => "NODE_INIT",
            EventTag::Published => "PUBL_MSG",
            EventTag::ReceivedState => "RECV_STATE",
            EventTag::ReceivedMessage => "RECV_MSG",
        }
    }
}

impl FromStr for EventTag {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NODE_INIT" => Ok(EventTag::NodeInit),
            "PUBL_MSG" => Ok(EventTag::Published),
            "RECV_STATE" => Ok(EventTag::ReceivedState),
            "RECV_MSG" => Ok(EventTag::ReceivedMessage),
            other => Err(TypeError::UnknownTag(other.to_string())),
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation written to the experiment log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRecord {
    /// `NODE_INIT::<node>`
    NodeInit {
        /// The node that started.
        node: NodeIdentity,
    },
    /// `PUBL_MSG::<node>::<message>`
    Published {
        /// The publishing node.
        node: NodeIdentity,
        /// The published payload, as text.
        message: String,
    },
    /// `RECV_STATE::<session>::<seq>`
    ReceivedState {
        /// The peer session with new data.
        session: RemoteSession,
        /// The missing sequence number.
        seq: SeqNo,
    },
    /// `RECV_MSG::<node>::<content>`
    ReceivedMessage {
        /// The receiving node.
        node: NodeIdentity,
        /// The fetched payload, as text.
        content: String,
    },
}

impl EventRecord {
    /// The tag of this record.
    pub fn tag(&self) -> EventTag {
        match self {
            EventRecord::NodeInit { .. } => EventTag::NodeInit,
            EventRecord::Published { .. } => EventTag::Published,
            EventRecord::ReceivedState { .. } => EventTag::ReceivedState,
            EventRecord::ReceivedMessage { .. } => EventTag::ReceivedMessage,
        }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = FIELD_SEPARATOR;
        let tag = self.tag();
        match self {
            Self::NodeInit { node } => write!(f, "{tag}{sep}{node}"),
            Self::Published { node, message } => write!(f, "{tag}{sep}{node}{sep}{message}"),
            Self::ReceivedState { session, seq } => write!(f, "{tag}{sep}{session}{sep}{seq}"),
            Self::ReceivedMessage { node, content } => write!(f, "{tag}{sep}{node}{sep}{content}"),
        }
    }
}

impl FromStr for EventRecord {
    type Err = TypeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (tag, rest) = line.split_once(FIELD_SEPARATOR).unwrap_or((line, ""));
        let tag: EventTag = tag.parse()?;
        let malformed = || TypeError::MalformedRecord {
            tag: tag.as_str(),
            line: line.to_string(),
        };

        match tag {
            EventTag::NodeInit => {
                if rest.is_empty() {
                    return Err(malformed());
                }
                Ok(EventRecord::NodeInit {
                    node: NodeIdentity::new(rest)?,
                })
            }
            EventTag::Published => {
                let (node, message) = rest.split_once(FIELD_SEPARATOR).ok_or_else(malformed)?;
                Ok(EventRecord::Published {
                    node: NodeIdentity::new(node)?,
                    message: message.to_string(),
                })
            }
            // Sessions are opaque and may contain the separator; the sequence
            // number is always the final field.
            EventTag::ReceivedState => {
                let (session, seq) = rest.rsplit_once(FIELD_SEPARATOR).ok_or_else(malformed)?;
                Ok(EventRecord::ReceivedState {
                    session: RemoteSession::new(session),
                    seq: seq.parse()?,
                })
            }
            EventTag::ReceivedMessage => {
                let (node, content) = rest.split_once(FIELD_SEPARATOR).ok_or_else(malformed)?;
                Ok(EventRecord::ReceivedMessage {
                    node: NodeIdentity::new(node)?,
                    content: content.to_string(),
                })
            }
        }
    }
}
