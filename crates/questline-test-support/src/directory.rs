//! Test directory: canned subquest summaries and script runnability.

use std::collections::{HashMap, HashSet};

use questline_core::directory::{QuestDirectory, SubquestSummary};
use questline_core::identity::QuestId;

/// A directory answering from fixed tables. Scripts are runnable unless
/// blocked.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    summaries: HashMap<QuestId, SubquestSummary>,
    blocked: HashSet<String>,
}

impl StaticDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the summary reported for `parent`.
    pub fn set_summary(&mut self, parent: QuestId, summary: SubquestSummary) {
        self.summaries.insert(parent, summary);
    }

    /// Makes `script` fail its runnability check.
    #[must_use]
    pub fn blocking(mut self, script: impl Into<String>) -> Self {
        self.blocked.insert(script.into());
        self
    }
}

impl QuestDirectory for StaticDirectory {
    fn subquest_summary(&self, parent: QuestId) -> SubquestSummary {
        self.summaries.get(&parent).copied().unwrap_or_default()
    }

    fn can_run_script(&self, script: &str) -> bool {
        !self.blocked.contains(script)
    }
}
