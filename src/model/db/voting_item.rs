use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use crate::model::common::voting_item::VotingItem;

/// A voting item as stored in the database, tagged with a version token.
///
/// The token is regenerated on every write, so a conditional replace on
/// `(_id, version)` only succeeds if nobody else wrote in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    #[serde(flatten)]
    pub item: VotingItem,
    pub version: ObjectId,
}

impl StoredItem {
    /// Wrap an item with a fresh version token.
    pub fn new(item: VotingItem) -> Self {
        Self {
            item,
            version: ObjectId::new(),
        }
    }

    /// Filter matching exactly this revision of the item.
    pub fn revision_filter(&self) -> Document {
        doc! {
            "_id": self.item.item_id.as_str(),
            "version": self.version,
        }
    }

    pub fn into_inner(self) -> VotingItem {
        self.item
    }
}

/// Filter matching any revision of the item with the given ID.
pub fn item_filter(item_id: &str) -> Document {
    doc! { "_id": item_id }
}
