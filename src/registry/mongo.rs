use log::debug;
use mongodb::{
    bson::doc,
    options::{FindOptions, ReplaceOptions},
    Database,
};
use rocket::{futures::TryStreamExt, http::Status};

use crate::error::{Error, Result, VotingError};
use crate::model::{
    common::voting_item::VotingItem,
    db::{item_filter, StoredItem},
    mongodb::{is_duplicate_key_error, Coll},
};

use super::store::{ItemStore, Mutation};

/// How many times a contended write is re-attempted before giving up.
const MAX_WRITE_ATTEMPTS: usize = 16;

/// MongoDB-backed item storage.
///
/// Modifications are optimistic: read the item and its version token, apply the
/// mutation to a copy, and replace the document only if the token is unchanged.
pub struct MongoStore {
    items: Coll<StoredItem>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            items: Coll::from_db(db),
        }
    }
}

#[rocket::async_trait]
impl ItemStore for MongoStore {
    async fn upsert(&self, item: VotingItem) -> Result<()> {
        let filter = item_filter(&item.item_id);
        let options = ReplaceOptions::builder().upsert(true).build();
        self.items
            .replace_one(filter, StoredItem::new(item), options)
            .await?;
        Ok(())
    }

    async fn insert(&self, item: VotingItem) -> Result<()> {
        let item_id = item.item_id.clone();
        match self.items.insert_one(StoredItem::new(item), None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e) => {
                Err(VotingError::AlreadyExists(item_id).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, item_id: &str) -> Result<Option<VotingItem>> {
        let stored = self.items.find_one(item_filter(item_id), None).await?;
        Ok(stored.map(StoredItem::into_inner))
    }

    async fn modify(&self, item_id: &str, mutation: Mutation<'_>) -> Result<()> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self
                .items
                .find_one(item_filter(item_id), None)
                .await?
                .ok_or_else(|| VotingError::not_found(item_id))?;

            let mut working = current.item.clone();
            mutation(&mut working)?;

            let result = self
                .items
                .replace_one(current.revision_filter(), StoredItem::new(working), None)
                .await?;
            if result.matched_count == 1 {
                return Ok(());
            }
            debug!("Voting item {item_id} changed under us (attempt {attempt}), re-reading");
        }

        Err(Error::Status(
            Status::Conflict,
            format!("Voting item {item_id} is too contended to update"),
        ))
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<(Vec<VotingItem>, u64)> {
        // The driver rejects skips beyond `i64::MAX`; nothing lives out there anyway.
        let options = FindOptions::builder()
            .sort(doc! { "_id": 1 })
            .skip(skip.min(i64::MAX as u64))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();
        let items: Vec<VotingItem> = self
            .items
            .find(None, options)
            .await?
            .map_ok(StoredItem::into_inner)
            .try_collect()
            .await?;
        // A separate read: the total may include writes made after the page.
        let total = self.items.count_documents(None, None).await?;
        Ok((items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mongodb::Client;

    use crate::model::common::voter::VoterId;

    /// Connect to a throwaway database named after a random number.
    async fn throwaway_db() -> Database {
        let db_uri = rocket::Config::figment()
            .extract_inner::<String>("db_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = Client::with_uri_str(&db_uri).await.unwrap();
        client.database(&format!("test{}", rand::random::<u32>()))
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB instance"]
    async fn stale_revision_is_not_overwritten() {
        let db = throwaway_db().await;
        let store = MongoStore::new(&db);
        let items = Coll::<StoredItem>::from_db(&db);
        store.upsert(VotingItem::example()).await.unwrap();

        // Take a revision, then let a cancellation land on top of it.
        let stale = items.find_one(item_filter("p1"), None).await.unwrap().unwrap();
        store
            .modify("p1", &mut |item: &mut VotingItem| {
                item.cancel();
                Ok(())
            })
            .await
            .unwrap();

        // A write against the stale revision must miss.
        let mut resurrected = stale.item.clone();
        resurrected.canceled = false;
        let result = items
            .replace_one(stale.revision_filter(), StoredItem::new(resurrected), None)
            .await
            .unwrap();
        assert_eq!(result.matched_count, 0);
        assert!(store.get("p1").await.unwrap().unwrap().canceled);

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    #[ignore = "requires a running MongoDB instance"]
    async fn votes_round_trip_through_the_database() {
        let db = throwaway_db().await;
        let store = MongoStore::new(&db);
        store.insert(VotingItem::example()).await.unwrap();

        let voter = VoterId::from("a.b$c");
        for _ in 0..3 {
            store
                .modify("p1", &mut |item: &mut VotingItem| item.cast_vote(150, "A", &voter))
                .await
                .unwrap();
        }
        let err = store.insert(VotingItem::example()).await.unwrap_err();
        assert_eq!(
            err.voting(),
            Some(&VotingError::AlreadyExists("p1".to_string()))
        );

        let item = store.get("p1").await.unwrap().unwrap();
        assert_eq!(item.votes.get(&voter), Some(&3));
        let (items, total) = store.list(0, 10).await.unwrap();
        assert_eq!((items.len(), total), (1, 1));

        // Far-off pages are empty rather than an error.
        let (items, total) = store.list(u64::MAX, 10).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 1);

        db.drop(None).await.unwrap();
    }
}
