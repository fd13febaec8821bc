//! # bench-types
//!
//! Shared types for the sync-bench harness.
//!
//! This crate provides the vocabulary used across all sync-bench crates:
//! - [`NodeIdentity`], [`RemoteSession`], [`SeqNo`] - Identity and ordering types
//! - [`MissingRange`] - Inclusive run of sequence numbers a peer published that we have not seen
//! - [`EventRecord`] - The `EVENT_TAG::field::...` lines written to the experiment log
//! - [`TypeError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod range;
mod record;

pub use error::TypeError;
pub use ids::{NodeIdentity, RemoteSession, SeqNo};
pub use range::MissingRange;
pub use record::{EventRecord, EventTag, FIELD_SEPARATOR};
