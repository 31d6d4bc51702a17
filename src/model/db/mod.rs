//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs are serialised as `_id`.
//! - Voter tallies are serialised as lists, never as documents keyed by voter.

mod voting_item;
pub use voting_item::{item_filter, StoredItem};
