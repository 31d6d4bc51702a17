//! Core domain types, independent of storage and transport.

pub mod status;
pub mod voter;
pub mod voting_item;

/// Timestamps are whole seconds since the Unix epoch.
pub type Timestamp = i64;
