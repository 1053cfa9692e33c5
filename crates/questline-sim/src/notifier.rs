//! Letter sink that writes notifications to the log.

use std::collections::BTreeMap;

use questline_core::identity::QuestId;
use questline_core::notify::{Letter, LetterSeverity, QuestNotifier};

/// Logs every letter and lifecycle notification and keeps the letters for
/// the end-of-run report.
#[derive(Debug, Default)]
pub struct LetterLog {
    letters: Vec<Letter>,
    outcomes: BTreeMap<String, u32>,
    cleaned_up: u32,
}

impl LetterLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Letters sent so far.
    #[must_use]
    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    /// How many quests ended with each outcome label.
    #[must_use]
    pub fn outcomes(&self) -> &BTreeMap<String, u32> {
        &self.outcomes
    }

    /// Cleanup notifications received.
    #[must_use]
    pub fn cleaned_up(&self) -> u32 {
        self.cleaned_up
    }
}

impl QuestNotifier for LetterLog {
    fn send_letter(&mut self, letter: Letter) {
        match letter.severity {
            LetterSeverity::Negative => {
                tracing::warn!(quest_id = %letter.quest_id, title = %letter.title, "letter");
            }
            LetterSeverity::Positive | LetterSeverity::Neutral => {
                tracing::info!(quest_id = %letter.quest_id, title = %letter.title, "letter");
            }
        }
        self.letters.push(letter);
    }

    fn quest_ended(&mut self, quest_id: QuestId, outcome: &str) {
        tracing::debug!(%quest_id, outcome, "quest end noted");
        *self.outcomes.entry(outcome.to_owned()).or_default() += 1;
    }

    fn quest_cleaned_up(&mut self, quest_id: QuestId, state: &str) {
        tracing::debug!(%quest_id, state, "quest cleanup noted");
        self.cleaned_up += 1;
    }
}
