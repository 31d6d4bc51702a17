//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Voter tallies are serialised as JSON objects keyed by voter.
//! - Timestamps are serialised as integer seconds since the Unix epoch.

pub mod caller;
pub mod item;
pub mod pagination;
pub mod vote;
