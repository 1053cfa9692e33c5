//! Enabled/Disabled sub-machine for independently completable sub-goals.

use questline_core::signal::{Signal, SignalArgs};
use serde::{Deserialize, Serialize};

use super::part::PartContext;
use super::state::EndOutcome;

/// State of an activable part. Disabled is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivableState {
    /// Ticking and eligible to complete.
    #[default]
    Enabled,
    /// Inert.
    Disabled,
}

/// Sub-machine embedded in activable parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Activable {
    state: ActivableState,
    #[serde(default)]
    disabled_tick: Option<i64>,
    /// Tag that disables the part without completing it.
    #[serde(default)]
    pub in_signal_disable: Option<String>,
    /// Tag published when the part completes.
    #[serde(default)]
    pub out_signal_completed: Option<String>,
    /// Outcome requested of the quest when the part completes.
    #[serde(default)]
    pub outcome_on_complete: Option<EndOutcome>,
    /// Outcome requested of the quest when the part fails.
    #[serde(default)]
    pub outcome_on_fail: Option<EndOutcome>,
}

impl Activable {
    /// A fresh, Enabled sub-machine with no side effects configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ends the quest with `outcome` when the part completes.
    #[must_use]
    pub fn ending_quest_on_complete(mut self, outcome: EndOutcome) -> Self {
        self.outcome_on_complete = Some(outcome);
        self
    }

    /// Ends the quest with `outcome` when the part fails.
    #[must_use]
    pub fn ending_quest_on_fail(mut self, outcome: EndOutcome) -> Self {
        self.outcome_on_fail = Some(outcome);
        self
    }

    /// Publishes `tag` on completion.
    #[must_use]
    pub fn signalling_on_complete(mut self, tag: impl Into<String>) -> Self {
        self.out_signal_completed = Some(tag.into());
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ActivableState {
        self.state
    }

    /// Whether the part is Enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state == ActivableState::Enabled
    }

    /// Tick at which the part became Disabled.
    #[must_use]
    pub fn disabled_tick(&self) -> Option<i64> {
        self.disabled_tick
    }

    /// Moves to Disabled, publishes the completion signal with `args`, and
    /// requests the configured quest outcome. Returns `false` if already
    /// Disabled.
    pub fn complete(&mut self, ctx: &mut PartContext<'_, '_>, args: SignalArgs) -> bool {
        if !self.disable_at(ctx.tick()) {
            return false;
        }
        if let Some(tag) = &self.out_signal_completed {
            ctx.publish(Signal::new(tag.clone(), args));
        }
        if let Some(outcome) = self.outcome_on_complete {
            ctx.end_quest(outcome, true);
        }
        true
    }

    /// Moves to Disabled and requests the configured failure outcome.
    /// Returns `false` if already Disabled.
    pub fn fail(&mut self, ctx: &mut PartContext<'_, '_>) -> bool {
        if !self.disable_at(ctx.tick()) {
            return false;
        }
        if let Some(outcome) = self.outcome_on_fail {
            ctx.end_quest(outcome, true);
        }
        true
    }

    /// Disables without completing. Returns `false` if already Disabled.
    pub fn disable_at(&mut self, tick: i64) -> bool {
        if self.state == ActivableState::Disabled {
            return false;
        }
        self.state = ActivableState::Disabled;
        self.disabled_tick = Some(tick);
        true
    }

    /// Applies the disable control tag. Returns whether it matched.
    pub(crate) fn handle_control_signal(&mut self, signal: &Signal, tick: i64) -> bool {
        match &self.in_signal_disable {
            Some(tag) if tag == signal.tag() => self.disable_at(tick),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_is_terminal() {
        let mut activable = Activable::new();

        assert!(activable.disable_at(5));
        assert!(!activable.disable_at(9));
        assert_eq!(activable.state(), ActivableState::Disabled);
        assert_eq!(activable.disabled_tick(), Some(5));
    }

    #[test]
    fn test_control_signal_only_matches_configured_tag() {
        let mut activable = Activable {
            in_signal_disable: Some("Quest1.Stop".to_owned()),
            ..Activable::new()
        };

        let other = Signal::new("Quest1.Go", SignalArgs::new());
        let stop = Signal::new("Quest1.Stop", SignalArgs::new());

        assert!(!activable.handle_control_signal(&other, 1));
        assert!(activable.is_enabled());
        assert!(activable.handle_control_signal(&stop, 2));
        assert!(!activable.is_enabled());
    }
}
