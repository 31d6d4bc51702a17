use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// The stable identity of a caller, as resolved by the identity provider.
/// The registry never inspects it beyond using it as a map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterId(String);

impl VoterId {
    pub fn new(principal: impl Into<String>) -> Self {
        Self(principal.into())
    }
}

impl Deref for VoterId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for VoterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VoterId {
    fn from(principal: &str) -> Self {
        Self::new(principal)
    }
}

/// Per-voter counts of accepted vote events.
pub type Votes = HashMap<VoterId, u64>;
