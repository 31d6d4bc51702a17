use crate::error::{Result, VotingError};
use crate::model::common::voting_item::VotingItem;

/// A validate-then-apply step run against a working copy of one item.
/// Returning an error discards the copy. May be invoked more than once if the
/// store has to retry its commit, so it must not have outside side effects.
pub type Mutation<'a> =
    &'a mut (dyn FnMut(&mut VotingItem) -> std::result::Result<(), VotingError> + Send);

/// Keyed storage for voting items.
///
/// Implementations must make [`ItemStore::modify`] atomic with respect to every
/// other write on the same item, and must hand out owned snapshots from reads.
#[rocket::async_trait]
pub trait ItemStore: Send + Sync {
    /// Store the item, replacing any existing item with the same ID.
    async fn upsert(&self, item: VotingItem) -> Result<()>;

    /// Store the item, failing with [`VotingError::AlreadyExists`] if the ID is taken.
    async fn insert(&self, item: VotingItem) -> Result<()>;

    /// Fetch a snapshot of the item.
    async fn get(&self, item_id: &str) -> Result<Option<VotingItem>>;

    /// Atomically read, mutate and write back the item, failing with
    /// [`VotingError::NotFound`] if it does not exist.
    async fn modify(&self, item_id: &str, mutation: Mutation<'_>) -> Result<()>;

    /// A page of items ordered by ID, plus the total number of items.
    ///
    /// Stores that can, take both from one consistent view. Otherwise the
    /// total may be off by writes that land between the two reads.
    async fn list(&self, skip: u64, limit: u64) -> Result<(Vec<VotingItem>, u64)>;
}
