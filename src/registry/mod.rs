//! The voting registry: every rule about when a vote counts lives here.

use std::sync::Arc;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::clock::Clock;
use crate::error::{Error, Result, VotingError};
use crate::model::common::{
    status::VotingStatus,
    voter::{VoterId, Votes},
    voting_item::VotingItem,
    Timestamp,
};

mod memory;
mod mongo;
mod store;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use store::{ItemStore, Mutation};

/// What happens when an item is created with an ID that is already in use.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationPolicy {
    /// Last write wins: the old item and its votes are replaced.
    #[default]
    Upsert,
    /// Creation fails with [`VotingError::AlreadyExists`].
    RejectDuplicates,
}

/// A voting item together with its status at the moment it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub item: VotingItem,
    pub status: VotingStatus,
}

impl ItemSnapshot {
    fn at(now: Timestamp, item: VotingItem) -> Self {
        Self {
            status: item.status(now),
            item,
        }
    }
}

/// The registry of voting items.
///
/// Storage and time are injected; each operation reads the clock exactly once.
pub struct VotingRegistry {
    store: Arc<dyn ItemStore>,
    clock: Arc<dyn Clock>,
    creation_policy: CreationPolicy,
    strict_items: bool,
}

impl VotingRegistry {
    /// Create a registry with the default upsert policy and no item validation.
    pub fn new(store: impl ItemStore + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            store: Arc::new(store),
            clock: Arc::new(clock),
            creation_policy: CreationPolicy::default(),
            strict_items: false,
        }
    }

    pub fn with_creation_policy(mut self, creation_policy: CreationPolicy) -> Self {
        self.creation_policy = creation_policy;
        self
    }

    /// Reject items without options, with duplicate options, or with an empty window.
    pub fn with_strict_items(mut self, strict_items: bool) -> Self {
        self.strict_items = strict_items;
        self
    }

    pub fn creation_policy(&self) -> CreationPolicy {
        self.creation_policy
    }

    /// Create a voting item with no votes.
    pub async fn create_voting_item(
        &self,
        item_id: impl Into<String>,
        item_name: impl Into<String>,
        options: Vec<String>,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Result<()> {
        let item = VotingItem::new(item_id, item_name, options, start_time, end_time);
        let item_id = item.item_id.clone();
        if self.strict_items {
            item.validate().map_err(|e| refused("create", e.into()))?;
        }

        let stored = match self.creation_policy {
            CreationPolicy::Upsert => self.store.upsert(item).await,
            CreationPolicy::RejectDuplicates => self.store.insert(item).await,
        };
        stored.map_err(|e| refused("create", e))?;

        info!("Created voting item {item_id}");
        Ok(())
    }

    /// Record one vote by `voter` for `option`.
    pub async fn cast_vote(&self, item_id: &str, option: &str, voter: &VoterId) -> Result<()> {
        let now = self.clock.now();
        self.store
            .modify(item_id, &mut |item: &mut VotingItem| {
                item.cast_vote(now, option, voter)
            })
            .await
            .map_err(|e| refused("vote on", e))?;

        info!("Voter {voter} voted on item {item_id}");
        Ok(())
    }

    /// Succeed iff the item's window has closed and it was not canceled.
    pub async fn end_voting(&self, item_id: &str) -> Result<()> {
        let now = self.clock.now();
        let item = self.existing(item_id).await?;
        item.check_ended(now).map_err(|e| refused("end", e.into()))
    }

    /// Cancel the item. Canceling twice is not an error.
    pub async fn cancel_voting(&self, item_id: &str) -> Result<()> {
        self.store
            .modify(item_id, &mut |item: &mut VotingItem| {
                item.cancel();
                Ok(())
            })
            .await
            .map_err(|e| refused("cancel", e))?;

        info!("Canceled voting item {item_id}");
        Ok(())
    }

    /// A snapshot of the per-voter counters.
    pub async fn current_votes(&self, item_id: &str) -> Result<Votes> {
        Ok(self.existing(item_id).await?.votes)
    }

    pub async fn is_canceled(&self, item_id: &str) -> Result<bool> {
        Ok(self.existing(item_id).await?.canceled)
    }

    /// The item and its status right now.
    pub async fn voting_item(&self, item_id: &str) -> Result<ItemSnapshot> {
        let now = self.clock.now();
        let item = self.existing(item_id).await?;
        Ok(ItemSnapshot::at(now, item))
    }

    /// A page of items in ID order, plus the total number of items.
    pub async fn voting_items(&self, skip: u64, limit: u64) -> Result<(Vec<ItemSnapshot>, u64)> {
        let now = self.clock.now();
        let (items, total) = self.store.list(skip, limit).await?;
        let snapshots = items
            .into_iter()
            .map(|item| ItemSnapshot::at(now, item))
            .collect();
        Ok((snapshots, total))
    }

    async fn existing(&self, item_id: &str) -> Result<VotingItem> {
        self.store
            .get(item_id)
            .await?
            .ok_or_else(|| refused("read", VotingError::not_found(item_id).into()))
    }
}

/// Log a refused operation on the way out.
fn refused(operation: &str, err: Error) -> Error {
    match err.voting() {
        Some(reason) => debug!("Refused to {operation} voting item: {reason}"),
        None => warn!("Failed to {operation} voting item: {err}"),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    use rocket::tokio;

    use crate::clock::ManualClock;

    fn registry() -> (VotingRegistry, ManualClock) {
        let clock = ManualClock::new(0);
        (VotingRegistry::new(MemoryStore::new(), clock.clone()), clock)
    }

    fn options(options: &[&str]) -> Vec<String> {
        options.iter().map(|o| o.to_string()).collect()
    }

    fn voting_error(result: Result<impl std::fmt::Debug>) -> VotingError {
        result
            .unwrap_err()
            .voting()
            .cloned()
            .expect("expected a voting error")
    }

    #[rocket::async_test]
    async fn new_item_is_not_canceled() {
        let (registry, _) = registry();
        registry
            .create_voting_item("p1", "Lunch", options(&["A", "B"]), 100, 200)
            .await
            .unwrap();
        assert!(!registry.is_canceled("p1").await.unwrap());
        assert!(registry.current_votes("p1").await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn same_voter_twice_counts_twice() {
        let (registry, clock) = registry();
        registry
            .create_voting_item("p1", "Lunch", options(&["A", "B"]), 100, 200)
            .await
            .unwrap();

        clock.set(150);
        let v1 = VoterId::from("v1");
        registry.cast_vote("p1", "A", &v1).await.unwrap();
        registry.cast_vote("p1", "A", &v1).await.unwrap();

        let votes = registry.current_votes("p1").await.unwrap();
        assert_eq!(votes, Votes::from([(v1, 2)]));
    }

    #[rocket::async_test]
    async fn vote_after_window_is_invalid_period() {
        let (registry, clock) = registry();
        registry
            .create_voting_item("p2", "Lunch", options(&["A", "B"]), 100, 200)
            .await
            .unwrap();

        for now in [99, 200, 250] {
            clock.set(now);
            let err = voting_error(registry.cast_vote("p2", "A", &"v1".into()).await);
            assert_eq!(err, VotingError::InvalidPeriod("p2".to_string()));
        }
        assert!(registry.current_votes("p2").await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn missing_item_is_not_found_everywhere() {
        let (registry, _) = registry();
        let not_found = VotingError::NotFound("missing".to_string());

        assert_eq!(voting_error(registry.current_votes("missing").await), not_found);
        assert_eq!(voting_error(registry.is_canceled("missing").await), not_found);
        assert_eq!(voting_error(registry.cancel_voting("missing").await), not_found);
        assert_eq!(voting_error(registry.end_voting("missing").await), not_found);
        assert_eq!(voting_error(registry.voting_item("missing").await), not_found);
        assert_eq!(
            voting_error(registry.cast_vote("missing", "A", &"v1".into()).await),
            not_found
        );
    }

    #[rocket::async_test]
    async fn unknown_option_is_invalid_option() {
        let (registry, clock) = registry();
        registry
            .create_voting_item("p3", "Lunch", options(&["A"]), 100, 200)
            .await
            .unwrap();

        clock.set(150);
        let err = voting_error(registry.cast_vote("p3", "Z", &"v1".into()).await);
        assert_eq!(
            err,
            VotingError::InvalidOption {
                item_id: "p3".to_string(),
                option: "Z".to_string(),
            }
        );
        assert!(registry.current_votes("p3").await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn canceled_item_refuses_votes_at_any_time() {
        let (registry, clock) = registry();
        registry
            .create_voting_item("p1", "Lunch", options(&["A", "B"]), 100, 200)
            .await
            .unwrap();

        clock.set(150);
        registry.cast_vote("p1", "A", &"v1".into()).await.unwrap();
        registry.cancel_voting("p1").await.unwrap();
        registry.cancel_voting("p1").await.unwrap();
        assert!(registry.is_canceled("p1").await.unwrap());

        for now in [50, 150, 250] {
            clock.set(now);
            let err = voting_error(registry.cast_vote("p1", "A", &"v1".into()).await);
            assert_eq!(err, VotingError::InvalidPeriod("p1".to_string()));
        }
        // Earlier votes survive cancellation.
        let votes = registry.current_votes("p1").await.unwrap();
        assert_eq!(votes.get(&VoterId::from("v1")), Some(&1));
    }

    #[rocket::async_test]
    async fn cancel_is_allowed_before_and_after_window() {
        let (registry, clock) = registry();
        for id in ["early", "late"] {
            registry
                .create_voting_item(id, "Lunch", options(&["A"]), 100, 200)
                .await
                .unwrap();
        }
        clock.set(10);
        registry.cancel_voting("early").await.unwrap();
        clock.set(1000);
        registry.cancel_voting("late").await.unwrap();
        assert!(registry.is_canceled("early").await.unwrap());
        assert!(registry.is_canceled("late").await.unwrap());
    }

    #[rocket::async_test]
    async fn end_voting_is_a_pure_guard() {
        let (registry, clock) = registry();
        registry
            .create_voting_item("p1", "Lunch", options(&["A"]), 100, 200)
            .await
            .unwrap();

        clock.set(150);
        registry.cast_vote("p1", "A", &"v1".into()).await.unwrap();
        let err = voting_error(registry.end_voting("p1").await);
        assert_eq!(err, VotingError::InvalidPeriod("p1".to_string()));

        clock.set(200);
        registry.end_voting("p1").await.unwrap();
        registry.end_voting("p1").await.unwrap();
        let snapshot = registry.voting_item("p1").await.unwrap();
        assert_eq!(snapshot.status, VotingStatus::Ended);
        assert!(!snapshot.item.canceled);
        assert_eq!(snapshot.item.total_votes(), 1);

        registry.cancel_voting("p1").await.unwrap();
        let err = voting_error(registry.end_voting("p1").await);
        assert_eq!(err, VotingError::InvalidPeriod("p1".to_string()));
    }

    #[rocket::async_test]
    async fn upsert_replaces_item_and_votes() {
        let (registry, clock) = registry();
        registry
            .create_voting_item("p1", "Lunch", options(&["A"]), 100, 200)
            .await
            .unwrap();
        clock.set(150);
        registry.cast_vote("p1", "A", &"v1".into()).await.unwrap();
        registry.cancel_voting("p1").await.unwrap();

        registry
            .create_voting_item("p1", "Dinner", options(&["X"]), 100, 200)
            .await
            .unwrap();
        let snapshot = registry.voting_item("p1").await.unwrap();
        assert_eq!(snapshot.item.item_name, "Dinner");
        assert!(snapshot.item.votes.is_empty());
        assert!(!snapshot.item.canceled);
        assert_eq!(snapshot.status, VotingStatus::Active);
    }

    #[rocket::async_test]
    async fn reject_duplicates_keeps_original() {
        let clock = ManualClock::new(0);
        let registry = VotingRegistry::new(MemoryStore::new(), clock)
            .with_creation_policy(CreationPolicy::RejectDuplicates);
        registry
            .create_voting_item("p1", "Lunch", options(&["A"]), 100, 200)
            .await
            .unwrap();

        let err = voting_error(
            registry
                .create_voting_item("p1", "Dinner", options(&["X"]), 100, 200)
                .await,
        );
        assert_eq!(err, VotingError::AlreadyExists("p1".to_string()));
        let snapshot = registry.voting_item("p1").await.unwrap();
        assert_eq!(snapshot.item.item_name, "Lunch");
    }

    #[rocket::async_test]
    async fn lenient_by_default_strict_on_request() {
        let (registry, _) = registry();
        registry
            .create_voting_item("empty", "Nothing", vec![], 200, 100)
            .await
            .unwrap();
        assert!(!registry.is_canceled("empty").await.unwrap());

        let strict = VotingRegistry::new(MemoryStore::new(), ManualClock::new(0))
            .with_strict_items(true);
        let err = voting_error(
            strict
                .create_voting_item("empty", "Nothing", vec![], 200, 100)
                .await,
        );
        assert!(matches!(err, VotingError::InvalidItem { .. }));
        assert!(strict.voting_item("empty").await.is_err());
    }

    #[rocket::async_test]
    async fn strict_items_need_addressable_ids() {
        let strict = VotingRegistry::new(MemoryStore::new(), ManualClock::new(0))
            .with_strict_items(true);
        for item_id in ["", "lunch/dinner"] {
            let err = voting_error(
                strict
                    .create_voting_item(item_id, "Lunch", options(&["A"]), 100, 200)
                    .await,
            );
            assert!(matches!(err, VotingError::InvalidItem { .. }));
        }
        let (_, total) = strict.voting_items(0, 10).await.unwrap();
        assert_eq!(total, 0);
    }

    #[rocket::async_test]
    async fn counters_never_decrease() {
        let (registry, clock) = registry();
        registry
            .create_voting_item("p1", "Lunch", options(&["A", "B"]), 100, 200)
            .await
            .unwrap();
        let voter = VoterId::from("v1");

        let mut last = 0;
        for (now, option) in [(150, "A"), (150, "Z"), (250, "A"), (160, "B"), (10, "B")] {
            clock.set(now);
            let _ = registry.cast_vote("p1", option, &voter).await;
            let count = registry
                .current_votes("p1")
                .await
                .unwrap()
                .get(&voter)
                .copied()
                .unwrap_or(0);
            assert!(count >= last);
            last = count;
        }
        assert_eq!(last, 2);
    }

    #[rocket::async_test]
    async fn concurrent_votes_are_all_counted() {
        let (registry, clock) = registry();
        let registry = Arc::new(registry);
        registry
            .create_voting_item("p1", "Lunch", options(&["A", "B"]), 100, 200)
            .await
            .unwrap();
        clock.set(150);

        let handles = (0..200)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let voter = VoterId::new(format!("v{}", i % 10));
                    let option = if i % 2 == 0 { "A" } else { "B" };
                    registry.cast_vote("p1", option, &voter).await
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let votes = registry.current_votes("p1").await.unwrap();
        assert_eq!(votes.len(), 10);
        assert!(votes.values().all(|count| *count == 20));
    }

    #[rocket::async_test]
    async fn listing_reports_derived_status() {
        let (registry, clock) = registry();
        registry
            .create_voting_item("a", "Past", options(&["A"]), 0, 50)
            .await
            .unwrap();
        registry
            .create_voting_item("b", "Current", options(&["A"]), 50, 150)
            .await
            .unwrap();
        registry
            .create_voting_item("c", "Future", options(&["A"]), 150, 250)
            .await
            .unwrap();
        registry
            .create_voting_item("d", "Canceled", options(&["A"]), 50, 150)
            .await
            .unwrap();
        registry.cancel_voting("d").await.unwrap();
        clock.set(100);

        let (page, total) = registry.voting_items(0, 10).await.unwrap();
        assert_eq!(total, 4);
        let statuses = page.iter().map(|s| s.status).collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![
                VotingStatus::Ended,
                VotingStatus::Active,
                VotingStatus::Pending,
                VotingStatus::Canceled,
            ]
        );

        let (page, total) = registry.voting_items(3, 10).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].item.item_id, "d");
    }
}
