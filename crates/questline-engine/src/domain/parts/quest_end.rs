//! Ends the owning quest when a trigger signal arrives.

use questline_core::signal::Signal;
use serde::{Deserialize, Serialize};

use crate::domain::part::{PartBase, PartContext, PartResult, QuestPart};
use crate::domain::record::PartRecord;
use crate::domain::state::EndOutcome;

/// Requests `outcome` of the owning quest on `in_signal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestEndPart {
    /// Shared part state.
    #[serde(default)]
    pub base: PartBase,
    /// Trigger tag.
    pub in_signal: String,
    /// Outcome to record.
    pub outcome: EndOutcome,
    /// Whether an outcome letter should be sent.
    #[serde(default = "default_send_letter")]
    pub send_letter: bool,
}

fn default_send_letter() -> bool {
    true
}

impl QuestEndPart {
    /// Ends with `outcome` on `in_signal`, with a letter.
    #[must_use]
    pub fn new(in_signal: impl Into<String>, outcome: EndOutcome) -> Self {
        Self {
            base: PartBase::default(),
            in_signal: in_signal.into(),
            outcome,
            send_letter: true,
        }
    }

    /// Suppresses the outcome letter.
    #[must_use]
    pub fn quietly(mut self) -> Self {
        self.send_letter = false;
        self
    }
}

impl QuestPart for QuestEndPart {
    fn kind(&self) -> &'static str {
        "quest_end"
    }

    fn base(&self) -> &PartBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn on_signal(&mut self, signal: &Signal, ctx: &mut PartContext<'_, '_>) -> PartResult {
        if signal.tag() == self.in_signal {
            ctx.end_quest(self.outcome, self.send_letter);
        }
        Ok(())
    }

    fn to_record(&self) -> PartRecord {
        PartRecord::QuestEnd(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use questline_core::identity::{PartId, QuestId};
    use questline_core::signal::SignalArgs;

    use super::*;
    use crate::domain::part::QuestRequest;
    use crate::domain::state::QuestState;
    use crate::domain::testing::Host;

    fn deliver(part: &mut QuestEndPart, tag: &str) -> Vec<QuestRequest> {
        let mut host = Host::new();
        let mut env = host.env(5);
        let mut ctx = PartContext::new(QuestId(2), PartId(1), QuestState::Ongoing, &mut env);
        part.on_signal(&Signal::new(tag, SignalArgs::new()), &mut ctx)
            .unwrap();
        ctx.into_requests()
    }

    #[test]
    fn test_trigger_requests_quiet_failure() {
        // Arrange
        let mut part = QuestEndPart::new("Quest2.Lost", EndOutcome::Fail).quietly();

        // Act
        let requests = deliver(&mut part, "Quest2.Lost");

        // Assert
        match requests.as_slice() {
            [QuestRequest::End { outcome, send_letter }] => {
                assert_eq!(*outcome, EndOutcome::Fail);
                assert!(!send_letter);
            }
            other => panic!("expected one End request, got {other:?}"),
        }
    }

    #[test]
    fn test_other_tags_request_nothing() {
        // Arrange
        let mut part = QuestEndPart::new("Quest2.Won", EndOutcome::Success);

        // Act
        let requests = deliver(&mut part, "Quest2.Lost");

        // Assert
        assert!(requests.is_empty());
    }
}
