//! Countdown timer part.

use questline_core::entity::{EntityHandle, ReferenceResolver};
use questline_core::signal::SignalArgs;
use serde::{Deserialize, Serialize};

use crate::domain::activable::Activable;
use crate::domain::part::{PartBase, PartContext, PartResult, QuestPart};
use crate::domain::record::PartRecord;

/// Counts down `delay_ticks` while Enabled, then completes.
///
/// On completion the optional `expiry_target` (a world object that exists
/// only for the duration of the delay) is destroyed. If the quest cleans up
/// before the delay runs out, the target goes with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayPart {
    /// Shared part state.
    #[serde(default)]
    pub base: PartBase,
    /// Enabled/Disabled sub-machine.
    #[serde(default)]
    pub activable: Activable,
    /// Ticks to wait.
    pub delay_ticks: i64,
    #[serde(default)]
    ticks_passed: i64,
    /// World object destroyed when the delay finishes.
    #[serde(default)]
    pub expiry_target: Option<EntityHandle>,
    /// Prefix of the inspect-pane countdown line.
    #[serde(default)]
    pub inspect_label: Option<String>,
}

impl DelayPart {
    /// A delay of `delay_ticks` with no side effects configured.
    #[must_use]
    pub fn new(delay_ticks: i64) -> Self {
        Self {
            base: PartBase::default(),
            activable: Activable::new(),
            delay_ticks,
            ticks_passed: 0,
            expiry_target: None,
            inspect_label: None,
        }
    }

    /// Uses `activable` as the sub-machine.
    #[must_use]
    pub fn with_activable(mut self, activable: Activable) -> Self {
        self.activable = activable;
        self
    }

    /// Destroys `target` when the delay finishes and shows the countdown on
    /// its inspect pane.
    #[must_use]
    pub fn expiring(mut self, target: EntityHandle, label: impl Into<String>) -> Self {
        self.expiry_target = Some(target);
        self.inspect_label = Some(label.into());
        self
    }

    /// Ticks elapsed so far.
    #[must_use]
    pub fn ticks_passed(&self) -> i64 {
        self.ticks_passed
    }

    /// Ticks remaining, never negative.
    #[must_use]
    pub fn ticks_left(&self) -> i64 {
        (self.delay_ticks - self.ticks_passed).max(0)
    }

    fn finish(&mut self, ctx: &mut PartContext<'_, '_>) {
        let destroyed = self
            .expiry_target
            .take()
            .filter(|target| ctx.world().destroy(*target));
        if let Some(target) = destroyed {
            tracing::debug!(quest_id = %ctx.quest_id(), %target, "expiry target destroyed");
        }
        self.activable.complete(ctx, SignalArgs::new());
    }
}

impl QuestPart for DelayPart {
    fn kind(&self) -> &'static str {
        "delay"
    }

    fn base(&self) -> &PartBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn activable(&self) -> Option<&Activable> {
        Some(&self.activable)
    }

    fn activable_mut(&mut self) -> Option<&mut Activable> {
        Some(&mut self.activable)
    }

    fn tick(&mut self, ctx: &mut PartContext<'_, '_>) -> PartResult {
        self.ticks_passed += 1;
        if self.ticks_passed >= self.delay_ticks {
            self.finish(ctx);
        }
        Ok(())
    }

    fn cleanup(&mut self, ctx: &mut PartContext<'_, '_>) -> PartResult {
        let withdrawn = self
            .expiry_target
            .take()
            .filter(|target| ctx.world().destroy(*target));
        if let Some(target) = withdrawn {
            tracing::debug!(quest_id = %ctx.quest_id(), %target, ticks_left = self.ticks_left(), "expiry target withdrawn with quest");
        }
        Ok(())
    }

    fn look_targets(&self) -> Vec<EntityHandle> {
        self.expiry_target.into_iter().collect()
    }

    fn inspect_string(&self, target: EntityHandle) -> Option<String> {
        if self.expiry_target != Some(target) || !self.activable.is_enabled() {
            return None;
        }
        let label = self.inspect_label.as_deref().unwrap_or("Expires in");
        Some(format!("{label}: {} ticks", self.ticks_left()))
    }

    fn assign_debug_data(&mut self) {
        if self.delay_ticks <= 0 {
            self.delay_ticks = 60;
        }
    }

    fn on_entity_discarded(&mut self, entity: EntityHandle) {
        if self.expiry_target == Some(entity) {
            self.expiry_target = None;
        }
    }

    fn resolve_references(&mut self, resolver: &mut ReferenceResolver<'_>) {
        resolver.resolve_opt(&mut self.expiry_target);
    }

    fn to_record(&self) -> PartRecord {
        PartRecord::Delay(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use questline_core::identity::{PartId, QuestId};

    use super::*;
    use crate::domain::state::{EndOutcome, QuestState};
    use crate::domain::testing::Host;

    fn tick_once(part: &mut DelayPart, host: &mut Host, tick: i64) -> Vec<String> {
        let mut env = host.env(tick);
        let mut ctx = PartContext::new(QuestId(1), PartId(0), QuestState::Ongoing, &mut env);
        part.tick(&mut ctx).unwrap();
        ctx.into_requests()
            .into_iter()
            .map(|request| format!("{request:?}"))
            .collect()
    }

    #[test]
    fn test_completes_after_exact_delay() {
        // Arrange
        let mut host = Host::new();
        let mut part = DelayPart::new(3).with_activable(
            Activable::new()
                .signalling_on_complete("Quest1.DelayDone")
                .ending_quest_on_complete(EndOutcome::Success),
        );

        // Act
        let first = tick_once(&mut part, &mut host, 1);
        let second = tick_once(&mut part, &mut host, 2);
        let third = tick_once(&mut part, &mut host, 3);

        // Assert
        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(third.len(), 1);
        assert!(!part.activable.is_enabled());
        assert_eq!(part.activable.disabled_tick(), Some(3));
        assert_eq!(host.dispatcher.tags(), vec!["Quest1.DelayDone".to_owned()]);
    }

    #[test]
    fn test_destroys_expiry_target_on_finish() {
        // Arrange
        let target = EntityHandle::world_object(9);
        let mut host = Host::new();
        host.world.insert(target, "camp");
        let mut part = DelayPart::new(1).expiring(target, "Camp leaves in");

        // Act
        tick_once(&mut part, &mut host, 1);

        // Assert
        assert_eq!(host.world.destroyed, vec![target]);
        assert!(part.expiry_target.is_none());
    }

    #[test]
    fn test_inspect_string_shows_remaining_ticks() {
        // Arrange
        let target = EntityHandle::world_object(4);
        let mut host = Host::new();
        let mut part = DelayPart::new(10).expiring(target, "Leaves in");

        // Act
        tick_once(&mut part, &mut host, 1);

        // Assert
        assert_eq!(
            part.inspect_string(target).as_deref(),
            Some("Leaves in: 9 ticks")
        );
        assert!(part.inspect_string(EntityHandle::pawn(4)).is_none());
    }

    #[test]
    fn test_cleanup_before_expiry_withdraws_target() {
        // Arrange
        let target = EntityHandle::world_object(6);
        let mut host = Host::new();
        host.world.insert(target, "camp");
        let mut part = DelayPart::new(100).expiring(target, "Camp leaves in");
        tick_once(&mut part, &mut host, 1);

        // Act
        {
            let mut env = host.env(2);
            let mut ctx = PartContext::new(QuestId(1), PartId(0), QuestState::EndedFailed, &mut env);
            part.cleanup(&mut ctx).unwrap();
        }

        // Assert
        assert_eq!(host.world.destroyed, vec![target]);
        assert!(part.look_targets().is_empty());
        assert!(part.activable.is_enabled());
    }
}
