/// (De)serialize a [`Votes`](crate::model::common::voter::Votes) map as a
/// list of `{voter, count}` documents.
///
/// Voter IDs come from outside and may contain `.` or a leading `$`, neither of
/// which is safe in a MongoDB field name, so they are never used as keys.
pub mod serde_vote_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::model::common::voter::{VoterId, Votes};

    #[derive(Serialize, Deserialize)]
    struct VoteCount<V> {
        voter: V,
        count: u64,
    }

    pub fn serialize<S>(votes: &Votes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entries = votes
            .iter()
            .map(|(voter, count)| VoteCount {
                voter,
                count: *count,
            })
            .collect::<Vec<_>>();
        // Stable ordering keeps stored documents diffable.
        entries.sort_by(|a, b| a.voter.cmp(b.voter));
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Votes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<VoteCount<VoterId>>::deserialize(deserializer)?;
        let mut votes = Votes::with_capacity(entries.len());
        for entry in entries {
            *votes.entry(entry.voter).or_insert(0) += entry.count;
        }
        Ok(votes)
    }
}
