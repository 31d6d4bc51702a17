use std::collections::BTreeMap;

use rocket::tokio::sync::RwLock;

use crate::error::{Result, VotingError};
use crate::model::common::voting_item::VotingItem;

use super::store::{ItemStore, Mutation};

/// Process-local item storage. Every write holds the lock for its whole
/// read-validate-write step.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, VotingItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl ItemStore for MemoryStore {
    async fn upsert(&self, item: VotingItem) -> Result<()> {
        self.items.write().await.insert(item.item_id.clone(), item);
        Ok(())
    }

    async fn insert(&self, item: VotingItem) -> Result<()> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.item_id) {
            return Err(VotingError::AlreadyExists(item.item_id).into());
        }
        items.insert(item.item_id.clone(), item);
        Ok(())
    }

    async fn get(&self, item_id: &str) -> Result<Option<VotingItem>> {
        Ok(self.items.read().await.get(item_id).cloned())
    }

    async fn modify(&self, item_id: &str, mutation: Mutation<'_>) -> Result<()> {
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(item_id)
            .ok_or_else(|| VotingError::not_found(item_id))?;
        let mut working = stored.clone();
        mutation(&mut working)?;
        *stored = working;
        Ok(())
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<(Vec<VotingItem>, u64)> {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        // One guard for both, so the total always matches the page.
        let items = self.items.read().await;
        let page = items.values().skip(skip).take(limit).cloned().collect();
        Ok((page, items.len() as u64))
    }
}
