//! Quest and part identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process-unique quest identifier. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(pub u64);

impl QuestId {
    /// Prefix shared by every signal tag scoped to this quest, e.g. `Quest42.`.
    #[must_use]
    pub fn signal_prefix(self) -> String {
        format!("Quest{}.", self.0)
    }

    /// Builds a tag scoped to this quest: `Quest{id}.{suffix}`.
    #[must_use]
    pub fn scoped_tag(self, suffix: &str) -> String {
        format!("Quest{}.{suffix}", self.0)
    }
}

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quest{}", self.0)
    }
}

/// Identifier of a part within its owning quest, assigned at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub u32);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_tag_uses_quest_prefix() {
        let id = QuestId(42);

        assert_eq!(id.signal_prefix(), "Quest42.");
        assert_eq!(id.scoped_tag("Initiate"), "Quest42.Initiate");
    }

    #[test]
    fn test_prefix_does_not_match_longer_ids() {
        let tag = QuestId(421).scoped_tag("Foo");

        assert!(!tag.starts_with(&QuestId(42).signal_prefix()));
    }
}
