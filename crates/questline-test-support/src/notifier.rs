//! Test notifier: records letters and lifecycle notifications.

use questline_core::identity::QuestId;
use questline_core::notify::{Letter, QuestNotifier};

/// A notifier that records everything it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    /// Letters requested, in order.
    pub letters: Vec<Letter>,
    /// `(quest, outcome)` for every `quest_ended` call.
    pub ended: Vec<(QuestId, String)>,
    /// `(quest, state)` for every `quest_cleaned_up` call.
    pub cleaned_up: Vec<(QuestId, String)>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuestNotifier for RecordingNotifier {
    fn send_letter(&mut self, letter: Letter) {
        self.letters.push(letter);
    }

    fn quest_ended(&mut self, quest_id: QuestId, outcome: &str) {
        self.ended.push((quest_id, outcome.to_owned()));
    }

    fn quest_cleaned_up(&mut self, quest_id: QuestId, state: &str) {
        self.cleaned_up.push((quest_id, state.to_owned()));
    }
}
