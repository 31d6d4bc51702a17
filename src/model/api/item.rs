use serde::{Deserialize, Serialize};

use crate::model::common::{status::VotingStatus, Timestamp};
use crate::registry::ItemSnapshot;

/// A request to create (or replace) a voting item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingItemSpec {
    /// Creator-chosen unique ID.
    pub item_id: String,
    /// Display name.
    pub item_name: String,
    /// Options voters may choose from.
    pub options: Vec<String>,
    /// Voting opens at this instant.
    pub start_time: Timestamp,
    /// Voting closes at this instant.
    pub end_time: Timestamp,
}

/// An API-friendly description of a voting item, including its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingItemDescription {
    pub item_id: String,
    pub item_name: String,
    pub options: Vec<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub canceled: bool,
    /// Status as of the moment the description was produced.
    pub status: VotingStatus,
    /// Sum of all voters' counters.
    pub total_votes: u64,
}

impl From<ItemSnapshot> for VotingItemDescription {
    fn from(snapshot: ItemSnapshot) -> Self {
        let total_votes = snapshot.item.total_votes();
        let item = snapshot.item;
        Self {
            item_id: item.item_id,
            item_name: item.item_name,
            options: item.options,
            start_time: item.start_time,
            end_time: item.end_time,
            canceled: item.canceled,
            status: snapshot.status,
            total_votes,
        }
    }
}

/// The top-level view of a voting item used in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingItemSummary {
    pub item_id: String,
    pub item_name: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: VotingStatus,
}

impl From<ItemSnapshot> for VotingItemSummary {
    fn from(snapshot: ItemSnapshot) -> Self {
        Self {
            item_id: snapshot.item.item_id,
            item_name: snapshot.item.item_name,
            start_time: snapshot.item.start_time,
            end_time: snapshot.item.end_time,
            status: snapshot.status,
        }
    }
}
