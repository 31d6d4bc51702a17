use serde::{Deserialize, Serialize};

/// The option a caller wishes to vote for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub option: String,
}

#[cfg(test)]
impl VoteRequest {
    pub fn for_option(option: &str) -> Self {
        Self {
            option: option.to_string(),
        }
    }
}
