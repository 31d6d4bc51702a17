use serde::{Deserialize, Serialize};

use super::{voting_item::VotingItem, Timestamp};

/// Where a voting item sits in its lifecycle at a given instant.
///
/// Only cancellation is ever stored; every other state is recomputed from
/// the item's window and the current time on each access, so an item that has
/// "ended" is simply one whose window lies in the past.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStatus {
    /// The window has not opened yet.
    Pending,
    /// Votes are being accepted.
    Active,
    /// The window has closed.
    Ended,
    /// Canceled before or during the window. Terminal.
    Canceled,
}

impl VotingStatus {
    /// Compute the status of `item` at time `now`.
    pub fn at(now: Timestamp, item: &VotingItem) -> Self {
        if item.canceled {
            Self::Canceled
        } else if now < item.start_time {
            Self::Pending
        } else if now < item.end_time {
            Self::Active
        } else {
            Self::Ended
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}
