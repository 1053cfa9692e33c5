//! Relay part: fans one inbound signal out to several outbound tags.

use questline_core::signal::Signal;
use serde::{Deserialize, Serialize};

use crate::domain::part::{PartBase, PartContext, PartResult, QuestPart};
use crate::domain::record::PartRecord;

/// Re-publishes `in_signal` once per entry of `out_signals`, in declared
/// order, each carrying the inbound argument bag unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRelayPart {
    /// Shared part state.
    #[serde(default)]
    pub base: PartBase,
    /// Inbound tag.
    pub in_signal: String,
    /// Outbound tags.
    pub out_signals: Vec<String>,
}

impl SignalRelayPart {
    /// Relays `in_signal` to each of `out_signals`.
    #[must_use]
    pub fn new(in_signal: impl Into<String>, out_signals: Vec<String>) -> Self {
        Self {
            base: PartBase::default(),
            in_signal: in_signal.into(),
            out_signals,
        }
    }
}

impl QuestPart for SignalRelayPart {
    fn kind(&self) -> &'static str {
        "signal_relay"
    }

    fn base(&self) -> &PartBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn on_signal(&mut self, signal: &Signal, ctx: &mut PartContext<'_, '_>) -> PartResult {
        if signal.tag() != self.in_signal {
            return Ok(());
        }
        for tag in &self.out_signals {
            ctx.publish(Signal::new(tag.clone(), signal.args().clone()));
        }
        Ok(())
    }

    fn to_record(&self) -> PartRecord {
        PartRecord::SignalRelay(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use questline_core::identity::{PartId, QuestId};
    use questline_core::signal::SignalArgs;

    use super::*;
    use crate::domain::state::QuestState;
    use crate::domain::testing::Host;

    #[test]
    fn test_ignores_other_tags() {
        // Arrange
        let mut host = Host::new();
        let mut part = SignalRelayPart::new("Quest1.Go", vec!["Quest1.A".to_owned()]);

        // Act
        {
            let mut env = host.env(0);
            let mut ctx = PartContext::new(QuestId(1), PartId(0), QuestState::Ongoing, &mut env);
            part.on_signal(&Signal::new("Quest1.Stop", SignalArgs::new()), &mut ctx)
                .unwrap();
        }

        // Assert
        assert!(host.dispatcher.published().is_empty());
    }
}
