//! Subquest-generator part.

use std::collections::VecDeque;

use questline_core::rng;
use questline_core::signal::SignalArgs;
use serde::{Deserialize, Serialize};

use crate::domain::activable::Activable;
use crate::domain::part::{PartBase, PartContext, PartResult, QuestPart};
use crate::domain::record::PartRecord;

/// Periodically asks the driver for a subquest of the owning quest.
///
/// Candidate scripts are drawn from a shuffled queue. When the queue runs
/// dry it is refilled and reshuffled, and the script drawn last is never
/// drawn first again while an alternative exists. Scripts that fail the
/// directory's runnability check are skipped. The part completes once
/// `max_successful` subquests have succeeded, and stops for good when the
/// owning quest cleans up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubquestGeneratorPart {
    /// Shared part state.
    #[serde(default)]
    pub base: PartBase,
    /// Enabled/Disabled sub-machine.
    #[serde(default)]
    pub activable: Activable,
    /// Candidate script names.
    pub scripts: Vec<String>,
    /// Minimum ticks between two generated subquests.
    pub interval_ticks: i64,
    /// No new subquest while this many are active.
    pub max_active: u32,
    /// Completes once this many subquests have succeeded.
    pub max_successful: u32,
    #[serde(default)]
    queue: VecDeque<String>,
    #[serde(default)]
    last_script: Option<String>,
    #[serde(default)]
    ticks_since_last: i64,
}

impl SubquestGeneratorPart {
    /// Draws from `scripts` every `interval_ticks`.
    #[must_use]
    pub fn new(scripts: Vec<String>, interval_ticks: i64) -> Self {
        Self {
            base: PartBase::default(),
            activable: Activable::new(),
            scripts,
            interval_ticks,
            max_active: 1,
            max_successful: 1,
            queue: VecDeque::new(),
            last_script: None,
            ticks_since_last: 0,
        }
    }

    /// Uses `activable` as the sub-machine.
    #[must_use]
    pub fn with_activable(mut self, activable: Activable) -> Self {
        self.activable = activable;
        self
    }

    /// Sets the active and success limits.
    #[must_use]
    pub fn with_limits(mut self, max_active: u32, max_successful: u32) -> Self {
        self.max_active = max_active;
        self.max_successful = max_successful;
        self
    }

    /// Script most recently handed out.
    #[must_use]
    pub fn last_script(&self) -> Option<&str> {
        self.last_script.as_deref()
    }

    fn refill(&mut self, ctx: &mut PartContext<'_, '_>) {
        let mut fresh = self.scripts.clone();
        rng::shuffle(&mut fresh, ctx.rng());
        if fresh.len() > 1 && fresh.first() == self.last_script.as_ref() {
            fresh.rotate_left(1);
        }
        self.queue = fresh.into();
    }

    fn next_script(&mut self, ctx: &mut PartContext<'_, '_>) -> Option<String> {
        // Two passes over the catalogue are enough to see every script once
        // even when the first draw comes from a half-used queue.
        for _ in 0..self.scripts.len() * 2 {
            if self.queue.is_empty() {
                self.refill(ctx);
            }
            let script = self.queue.pop_front()?;
            if ctx.directory().can_run_script(&script) {
                return Some(script);
            }
            tracing::debug!(quest_id = %ctx.quest_id(), %script, "subquest script not runnable; skipped");
        }
        None
    }
}

impl QuestPart for SubquestGeneratorPart {
    fn kind(&self) -> &'static str {
        "subquest_generator"
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
        let summary = ctx.directory().subquest_summary(ctx.quest_id());
        if summary.succeeded >= self.max_successful {
            self.activable.complete(ctx, SignalArgs::new());
            return Ok(());
        }
        self.ticks_since_last += 1;
        if self.ticks_since_last < self.interval_ticks || summary.active >= self.max_active {
            return Ok(());
        }
        if let Some(script) = self.next_script(ctx) {
            self.ticks_since_last = 0;
            self.last_script = Some(script.clone());
            ctx.generate_subquest(script);
        }
        Ok(())
    }

    fn pre_cleanup(&mut self, ctx: &mut PartContext<'_, '_>) -> PartResult {
        self.queue.clear();
        if self.activable.disable_at(ctx.tick()) {
            tracing::debug!(quest_id = %ctx.quest_id(), "subquest generation stopped");
        }
        Ok(())
    }

    fn to_record(&self) -> PartRecord {
        PartRecord::SubquestGenerator(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use questline_core::directory::SubquestSummary;
    use questline_core::identity::{PartId, QuestId};
    use questline_test_support::{
        FakeWorld, RecordingDispatcher, RecordingNotifier, SequenceRng, StaticDirectory,
    };

    use super::*;
    use crate::domain::env::QuestEnv;
    use crate::domain::part::QuestRequest;
    use crate::domain::state::{EndOutcome, QuestState};

    struct Fixture {
        dispatcher: RecordingDispatcher,
        world: FakeWorld,
        notifier: RecordingNotifier,
        directory: StaticDirectory,
        rng: SequenceRng,
    }

    impl Fixture {
        fn new(directory: StaticDirectory, rng: SequenceRng) -> Self {
            Self {
                dispatcher: RecordingDispatcher::new(),
                world: FakeWorld::new(),
                notifier: RecordingNotifier::new(),
                directory,
                rng,
            }
        }

        fn env(&mut self, tick: i64) -> QuestEnv<'_> {
            QuestEnv {
                tick,
                dispatcher: &mut self.dispatcher,
                world: &mut self.world,
                notifier: &mut self.notifier,
                directory: &self.directory,
                rng: &mut self.rng,
            }
        }

        fn tick(&mut self, part: &mut SubquestGeneratorPart, tick: i64) -> Vec<QuestRequest> {
            let mut env = self.env(tick);
            let mut ctx = PartContext::new(QuestId(7), PartId(0), QuestState::Ongoing, &mut env);
            part.tick(&mut ctx).unwrap();
            ctx.into_requests()
        }
    }

    fn scripts(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    fn generated(requests: &[QuestRequest]) -> Vec<String> {
        requests
            .iter()
            .filter_map(|request| match request {
                QuestRequest::GenerateSubquest { script } => Some(script.clone()),
                QuestRequest::End { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_waits_for_interval_before_generating() {
        // Arrange
        let mut fixture = Fixture::new(StaticDirectory::new(), SequenceRng::default());
        let mut part = SubquestGeneratorPart::new(scripts(&["raid"]), 3);

        // Act
        let first = fixture.tick(&mut part, 1);
        let second = fixture.tick(&mut part, 2);
        let third = fixture.tick(&mut part, 3);

        // Assert
        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(generated(&third), vec!["raid".to_owned()]);
    }

    #[test]
    fn test_refill_never_repeats_last_script_first() {
        // Arrange
        // First refill keeps [a, b]; the second shuffles to [b, a], which
        // would repeat "b" straight away.
        let mut fixture = Fixture::new(
            StaticDirectory::new(),
            SequenceRng::new(vec![1, 0, 1, 0]),
        );
        let mut part = SubquestGeneratorPart::new(scripts(&["a", "b"]), 1).with_limits(5, 5);

        // Act
        let drawn: Vec<String> = (1..=3)
            .flat_map(|tick| generated(&fixture.tick(&mut part, tick)))
            .collect();

        // Assert
        assert_eq!(drawn, scripts(&["a", "b", "a"]));
        assert_eq!(part.last_script(), Some("a"));
    }

    #[test]
    fn test_skips_scripts_that_cannot_run() {
        // Arrange
        let mut fixture = Fixture::new(
            StaticDirectory::new().blocking("a"),
            SequenceRng::new(vec![1]),
        );
        let mut part = SubquestGeneratorPart::new(scripts(&["a", "b"]), 1);

        // Act
        let requests = fixture.tick(&mut part, 1);

        // Assert
        assert_eq!(generated(&requests), vec!["b".to_owned()]);
    }

    #[test]
    fn test_holds_back_while_too_many_active() {
        // Arrange
        let mut directory = StaticDirectory::new();
        directory.set_summary(
            QuestId(7),
            SubquestSummary {
                active: 1,
                succeeded: 0,
                failed: 0,
            },
        );
        let mut fixture = Fixture::new(directory, SequenceRng::default());
        let mut part = SubquestGeneratorPart::new(scripts(&["a"]), 1);

        // Act
        let requests = fixture.tick(&mut part, 1);

        // Assert
        assert!(requests.is_empty());
    }

    #[test]
    fn test_completes_after_enough_successes() {
        // Arrange
        let mut directory = StaticDirectory::new();
        directory.set_summary(
            QuestId(7),
            SubquestSummary {
                active: 0,
                succeeded: 2,
                failed: 1,
            },
        );
        let mut fixture = Fixture::new(directory, SequenceRng::default());
        let mut part = SubquestGeneratorPart::new(scripts(&["a"]), 1)
            .with_limits(1, 2)
            .with_activable(
                Activable::new().ending_quest_on_complete(EndOutcome::Success),
            );

        // Act
        let requests = fixture.tick(&mut part, 1);

        // Assert
        assert!(!part.activable.is_enabled());
        assert!(matches!(requests.as_slice(), [QuestRequest::End { .. }]));
    }

    #[test]
    fn test_pre_cleanup_stops_generation() {
        // Arrange
        let mut fixture = Fixture::new(StaticDirectory::new(), SequenceRng::new(vec![0]));
        let mut part = SubquestGeneratorPart::new(scripts(&["a", "b"]), 1).with_limits(5, 5);
        fixture.tick(&mut part, 1);

        // Act
        {
            let mut env = fixture.env(2);
            let mut ctx =
                PartContext::new(QuestId(7), PartId(0), QuestState::EndedFailed, &mut env);
            part.pre_cleanup(&mut ctx).unwrap();
        }

        // Assert
        assert!(!part.activable.is_enabled());
        assert_eq!(part.activable.disabled_tick(), Some(2));
        assert!(part.queue.is_empty());
    }
}
