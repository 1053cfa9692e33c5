//! Read-only views of quests for diagnostics and reports.

use questline_core::error::DomainError;
use questline_core::identity::{PartId, QuestId};
use serde::Serialize;

use crate::domain::activable::Activable;
use crate::domain::quest::Quest;

/// Read-only view of one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartView {
    /// Part id within its quest.
    pub part_id: Option<PartId>,
    /// Part kind.
    pub kind: &'static str,
    /// `Some(enabled)` for activable parts.
    pub enabled: Option<bool>,
}

/// Read-only view of a quest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestView {
    pub quest_id: QuestId,
    pub name: String,
    pub state: &'static str,
    pub historical: bool,
    pub outcome: &'static str,
    pub tags: Vec<String>,
    pub parent: Option<QuestId>,
    pub appearance_tick: i64,
    pub acceptance_tick: i64,
    pub ticks_until_acceptance_expiry: i64,
    pub cleanup_tick: i64,
    pub hidden_in_ui: bool,
    pub parts: Vec<PartView>,
}

impl From<&Quest> for QuestView {
    fn from(quest: &Quest) -> Self {
        let state = quest.state();
        Self {
            quest_id: quest.id(),
            name: quest.name.clone(),
            state: state.as_str(),
            historical: state.is_historical(),
            outcome: quest.end_outcome().as_str(),
            tags: quest.tags.iter().cloned().collect(),
            parent: quest.parent(),
            appearance_tick: quest.appearance_tick(),
            acceptance_tick: quest.acceptance_tick(),
            ticks_until_acceptance_expiry: quest.ticks_until_acceptance_expiry(),
            cleanup_tick: quest.cleanup_tick(),
            hidden_in_ui: quest.hidden_in_ui(),
            parts: quest
                .parts()
                .map(|part| PartView {
                    part_id: part.base().id(),
                    kind: part.kind(),
                    enabled: part.activable().map(Activable::is_enabled),
                })
                .collect(),
        }
    }
}

/// Finds one quest by id.
///
/// # Errors
///
/// Returns `DomainError::QuestNotFound` if no quest has that id.
pub fn get_quest_by_id(quests: &[Quest], quest_id: QuestId) -> Result<QuestView, DomainError> {
    quests
        .iter()
        .find(|quest| quest.id() == quest_id)
        .map(QuestView::from)
        .ok_or(DomainError::QuestNotFound(quest_id))
}

/// Views of every quest, optionally skipping historical ones.
#[must_use]
pub fn list_quests(quests: &[Quest], include_historical: bool) -> Vec<QuestView> {
    quests
        .iter()
        .filter(|quest| include_historical || !quest.is_historical())
        .map(QuestView::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parts::{DelayPart, SignalRelayPart};
    use crate::domain::state::EndOutcome;
    use crate::domain::testing::Host;

    #[test]
    fn test_get_quest_by_id_reports_state_and_parts() {
        // Arrange
        let mut host = Host::new();
        let mut quest = Quest::new(QuestId(3), "Caravan", 12).with_tag("trade");
        quest.accept(None, &mut host.env(20));
        quest.add_part(Box::new(DelayPart::new(5))).unwrap();
        quest
            .add_part(Box::new(SignalRelayPart::new("Quest3.Go", Vec::new())))
            .unwrap();

        // Act
        let view = get_quest_by_id(&[quest], QuestId(3)).unwrap();

        // Assert
        assert_eq!(view.state, "ongoing");
        assert_eq!(view.acceptance_tick, 20);
        assert_eq!(view.tags, vec!["trade".to_owned()]);
        assert_eq!(view.parts.len(), 2);
        assert_eq!(view.parts[0].kind, "delay");
        assert_eq!(view.parts[0].enabled, Some(true));
        assert_eq!(view.parts[1].enabled, None);
    }

    #[test]
    fn test_get_quest_by_id_unknown_is_not_found() {
        // Act
        let result = get_quest_by_id(&[], QuestId(99));

        // Assert
        match result {
            Err(DomainError::QuestNotFound(id)) => assert_eq!(id, QuestId(99)),
            other => panic!("expected QuestNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_list_quests_can_skip_historical() {
        // Arrange
        let mut host = Host::new();
        let live = Quest::new(QuestId(1), "Live", 0);
        let mut done = Quest::new(QuestId(2), "Done", 0);
        done.accept(None, &mut host.env(0));
        done.end(EndOutcome::Success, false, false, &mut host.env(1))
            .unwrap();
        let quests = vec![live, done];

        // Act
        let current = list_quests(&quests, false);
        let all = list_quests(&quests, true);

        // Assert
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].quest_id, QuestId(1));
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].outcome, "success");
    }
}
