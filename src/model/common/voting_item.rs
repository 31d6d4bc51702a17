use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::VotingError;
use crate::model::mongodb::serde_vote_list;

use super::{
    status::VotingStatus,
    voter::{VoterId, Votes},
    Timestamp,
};

/// A single poll: a fixed option set, a voting window, and per-voter tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingItem {
    /// Creator-assigned unique ID.
    #[serde(rename = "_id")]
    pub item_id: String,
    /// Free-text label.
    pub item_name: String,
    /// Allowed vote choices, in creation order.
    pub options: Vec<String>,
    /// Votes are accepted from this instant...
    pub start_time: Timestamp,
    /// ...up to but excluding this one.
    pub end_time: Timestamp,
    /// How many times each voter has successfully voted on this item.
    #[serde(with = "serde_vote_list")]
    pub votes: Votes,
    /// Once set, never cleared.
    pub canceled: bool,
}

impl VotingItem {
    /// Create a fresh item with no votes.
    pub fn new(
        item_id: impl Into<String>,
        item_name: impl Into<String>,
        options: Vec<String>,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            item_name: item_name.into(),
            options,
            start_time,
            end_time,
            votes: Votes::new(),
            canceled: false,
        }
    }

    /// The derived lifecycle status at `now`.
    pub fn status(&self, now: Timestamp) -> VotingStatus {
        VotingStatus::at(now, self)
    }

    /// Does this item offer the given option?
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Check that a vote for `option` would be accepted at `now`.
    ///
    /// The period is checked before the option, so voting for a bogus option
    /// on a closed item reports the closed period.
    pub fn check_vote(&self, now: Timestamp, option: &str) -> Result<(), VotingError> {
        if !self.status(now).is_active() {
            return Err(VotingError::InvalidPeriod(self.item_id.clone()));
        }
        if !self.has_option(option) {
            return Err(VotingError::InvalidOption {
                item_id: self.item_id.clone(),
                option: option.to_string(),
            });
        }
        Ok(())
    }

    /// Check that the voting window has closed without the item being canceled.
    pub fn check_ended(&self, now: Timestamp) -> Result<(), VotingError> {
        match self.status(now) {
            VotingStatus::Ended => Ok(()),
            _ => Err(VotingError::InvalidPeriod(self.item_id.clone())),
        }
    }

    /// Validate and record a vote. Nothing changes if validation fails.
    pub fn cast_vote(
        &mut self,
        now: Timestamp,
        option: &str,
        voter: &VoterId,
    ) -> Result<(), VotingError> {
        self.check_vote(now, option)?;
        self.record_vote(voter);
        Ok(())
    }

    /// Unconditionally bump the voter's counter.
    fn record_vote(&mut self, voter: &VoterId) {
        let count = self.votes.entry(voter.clone()).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Mark the item as canceled. Idempotent.
    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    /// Sum of every voter's counter.
    pub fn total_votes(&self) -> u64 {
        self.votes.values().fold(0, |acc, n| acc.saturating_add(*n))
    }

    /// Reject items that could never be voted on: an ID no route can address,
    /// no options, duplicate options, or an empty window.
    pub fn validate(&self) -> Result<(), VotingError> {
        let invalid = |reason: &str| {
            Err(VotingError::InvalidItem {
                item_id: self.item_id.clone(),
                reason: reason.to_string(),
            })
        };
        if self.item_id.is_empty() {
            return invalid("empty ID");
        }
        if self.item_id.contains('/') {
            return invalid("ID contains '/'");
        }
        if self.options.is_empty() {
            return invalid("no options");
        }
        let unique: HashSet<&String> = self.options.iter().collect();
        if unique.len() != self.options.len() {
            return invalid("duplicate options");
        }
        if self.start_time >= self.end_time {
            return invalid("start time must precede end time");
        }
        Ok(())
    }
}
