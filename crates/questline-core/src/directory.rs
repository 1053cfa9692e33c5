//! Read-only lookups over the set of live quests.

use serde::{Deserialize, Serialize};

use crate::identity::QuestId;

/// Counts of the subquests derived from a parent quest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubquestSummary {
    /// Subquests that are not yet historical.
    pub active: u32,
    /// Subquests that ended successfully.
    pub succeeded: u32,
    /// Subquests that ended any other way.
    pub failed: u32,
}

/// Directory of live quests, owned by the driver.
pub trait QuestDirectory {
    /// Summary of the subquests whose parent is `parent`.
    fn subquest_summary(&self, parent: QuestId) -> SubquestSummary;

    /// Whether the named quest script may be generated right now.
    fn can_run_script(&self, script: &str) -> bool;
}
