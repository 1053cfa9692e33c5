//! User-visible notification and lifecycle notification boundary.

use serde::{Deserialize, Serialize};

use crate::entity::EntityHandle;
use crate::identity::QuestId;

/// How a letter is classified when shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterSeverity {
    /// Good news.
    Positive,
    /// Informational.
    Neutral,
    /// Bad news.
    Negative,
}

/// A letter requested by the engine. Rendering happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    /// The quest that requested the letter.
    pub quest_id: QuestId,
    /// Letter title.
    pub title: String,
    /// Letter body.
    pub body: String,
    /// Severity classification.
    pub severity: LetterSeverity,
    /// Entities the letter should let the player jump to.
    pub look_targets: Vec<EntityHandle>,
    /// Whether the outcome sound should play.
    pub play_sound: bool,
}

/// Receives letters and quest lifecycle transitions.
///
/// Faction and ideology bookkeeping subscribe here; they react to the engine
/// and never drive it.
pub trait QuestNotifier {
    /// Requests a letter.
    fn send_letter(&mut self, letter: Letter);

    /// A quest has ended with the given outcome label (`success`, `fail`, ...).
    fn quest_ended(&mut self, quest_id: QuestId, outcome: &str);

    /// A quest finished its one-shot cleanup pass in the given state label.
    fn quest_cleaned_up(&mut self, quest_id: QuestId, state: &str);
}
