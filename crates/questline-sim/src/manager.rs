//! The quest driver.
//!
//! [`QuestManager`] owns every quest, live and historical, in registry order.
//! Each step ticks all quests, then drains the signal queue one signal at a
//! time, offering each signal to every quest. Between deliveries it fans out
//! entity discards and turns subquest requests into new quests.

use std::collections::HashMap;

use questline_core::directory::{QuestDirectory, SubquestSummary};
use questline_core::dispatcher::SignalDispatcher;
use questline_core::entity::EntityHandle;
use questline_core::error::DomainError;
use questline_core::identity::QuestId;
use questline_core::repository::{Clock, SaveRepository, StoredSnapshot};
use questline_core::rng::SeededRng;
use questline_core::signal::Signal;
use questline_core::world::WorldAccess;
use questline_engine::application::command_handlers::{
    LoadedGame, handle_load_quests, handle_save_quests,
};
use questline_engine::domain::env::QuestEnv;
use questline_engine::domain::parts::IncidentEvent;
use questline_engine::domain::quest::Quest;
use questline_engine::domain::state::{EndOutcome, QuestState};
use serde::Serialize;

use crate::catalogue::ScriptCatalogue;
use crate::config::DEFAULT_SIGNAL_BUDGET;
use crate::dispatcher::QueuedDispatcher;
use crate::notifier::LetterLog;
use crate::world::SandboxWorld;

/// What one step (or a run of steps) did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Tick the step ran at; for a run, the last tick.
    pub tick: i64,
    /// Signals offered to the quests.
    pub signals_delivered: usize,
    /// Signals still queued because the budget ran out.
    pub signals_deferred: usize,
    /// Subquests created from part requests.
    pub subquests_created: usize,
    /// Part faults caught by the dispatch boundary.
    pub faults: usize,
}

impl StepReport {
    fn absorb(&mut self, other: StepReport) {
        self.tick = other.tick;
        self.signals_delivered += other.signals_delivered;
        self.signals_deferred = other.signals_deferred;
        self.subquests_created += other.subquests_created;
        self.faults += other.faults;
    }
}

/// Collaborators lent to quests for the duration of one call.
#[derive(Debug)]
struct Collaborators {
    dispatcher: QueuedDispatcher,
    world: SandboxWorld,
    notifier: LetterLog,
    rng: SeededRng,
}

impl Collaborators {
    fn env<'a>(&'a mut self, tick: i64, directory: &'a dyn QuestDirectory) -> QuestEnv<'a> {
        QuestEnv {
            tick,
            dispatcher: &mut self.dispatcher,
            world: &mut self.world,
            notifier: &mut self.notifier,
            directory,
            rng: &mut self.rng,
        }
    }
}

/// Subquest counts captured before a pass, plus the script catalogue.
struct DirectorySnapshot<'c> {
    summaries: HashMap<QuestId, SubquestSummary>,
    catalogue: &'c ScriptCatalogue,
}

impl<'c> DirectorySnapshot<'c> {
    fn capture(quests: &[Quest], catalogue: &'c ScriptCatalogue) -> Self {
        let mut summaries: HashMap<QuestId, SubquestSummary> = HashMap::new();
        for quest in quests {
            let Some(parent) = quest.parent() else {
                continue;
            };
            let summary = summaries.entry(parent).or_default();
            match quest.state() {
                QuestState::NotYetAccepted | QuestState::Ongoing => summary.active += 1,
                QuestState::EndedSuccess => summary.succeeded += 1,
                _ => summary.failed += 1,
            }
        }
        Self {
            summaries,
            catalogue,
        }
    }
}

impl QuestDirectory for DirectorySnapshot<'_> {
    fn subquest_summary(&self, parent: QuestId) -> SubquestSummary {
        self.summaries.get(&parent).copied().unwrap_or_default()
    }

    fn can_run_script(&self, script: &str) -> bool {
        self.catalogue.contains(script)
    }
}

/// Owns all quests and routes ticks and signals to them.
#[derive(Debug)]
pub struct QuestManager {
    quests: Vec<Quest>,
    next_quest_id: u64,
    tick: i64,
    signal_budget: usize,
    host: Collaborators,
    catalogue: ScriptCatalogue,
}

impl QuestManager {
    /// A manager over `world` with an RNG seeded from `seed`.
    #[must_use]
    pub fn new(world: SandboxWorld, catalogue: ScriptCatalogue, seed: u64) -> Self {
        Self {
            quests: Vec::new(),
            next_quest_id: 1,
            tick: 0,
            signal_budget: DEFAULT_SIGNAL_BUDGET,
            host: Collaborators {
                dispatcher: QueuedDispatcher::new(),
                world,
                notifier: LetterLog::new(),
                rng: SeededRng::new(seed),
            },
            catalogue,
        }
    }

    /// Caps the signals delivered per step. Clamped to at least one.
    #[must_use]
    pub fn with_signal_budget(mut self, budget: usize) -> Self {
        self.signal_budget = budget.max(1);
        self
    }

    // --- accessors ---

    /// The tick the next step will run at.
    #[must_use]
    pub fn tick(&self) -> i64 {
        self.tick
    }

    /// All quests in registry order.
    #[must_use]
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    /// The quest with `id`.
    #[must_use]
    pub fn quest(&self, id: QuestId) -> Option<&Quest> {
        self.quests.iter().find(|quest| quest.id() == id)
    }

    /// The world quests run against.
    #[must_use]
    pub fn world(&self) -> &SandboxWorld {
        &self.host.world
    }

    /// Mutable access to the world.
    pub fn world_mut(&mut self) -> &mut SandboxWorld {
        &mut self.host.world
    }

    /// Letters and lifecycle notifications received so far.
    #[must_use]
    pub fn letters(&self) -> &LetterLog {
        &self.host.notifier
    }

    /// Signals waiting for delivery.
    #[must_use]
    pub fn pending_signals(&self) -> usize {
        self.host.dispatcher.len()
    }

    /// Hands out the next quest id. Ids are never reused.
    pub fn allocate_id(&mut self) -> QuestId {
        let id = QuestId(self.next_quest_id);
        self.next_quest_id = self.next_quest_id.saturating_add(1);
        id
    }

    // --- quest operations ---

    /// Registers `quest` and announces it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a quest with the same id is
    /// already registered, or if the id leaves no room for a successor.
    pub fn add_quest(&mut self, quest: Quest) -> Result<QuestId, DomainError> {
        let id = quest.id();
        if self.quest(id).is_some() {
            return Err(DomainError::Validation(format!("{id} is already registered")));
        }
        let Some(successor) = id.0.checked_add(1) else {
            return Err(DomainError::Validation(format!("{id} is out of range")));
        };
        self.next_quest_id = self.next_quest_id.max(successor);
        self.quests.push(quest);
        self.with_quest(id, |quest, env| quest.post_added(env))?;
        Ok(id)
    }

    /// Accepts the quest on behalf of `by`. Returns whether it was accepted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::QuestNotFound` for an unknown id.
    pub fn accept(&mut self, id: QuestId, by: Option<EntityHandle>) -> Result<bool, DomainError> {
        self.with_quest(id, |quest, env| quest.accept(by, env))
    }

    /// Starts the quest already accepted. Returns whether it applied.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::QuestNotFound` for an unknown id.
    pub fn accept_initially(&mut self, id: QuestId) -> Result<bool, DomainError> {
        self.with_quest(id, Quest::set_initially_accepted)
    }

    /// Dismisses an open offer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::QuestNotFound` for an unknown id.
    pub fn dismiss(&mut self, id: QuestId) -> Result<(), DomainError> {
        self.with_quest(id, |quest, _| quest.dismiss())
    }

    /// Ends the quest with a letter and sound.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::QuestNotFound` for an unknown id, or
    /// `DomainError::InvalidState` if the quest already ended.
    pub fn end_quest(&mut self, id: QuestId, outcome: EndOutcome) -> Result<(), DomainError> {
        self.with_quest(id, |quest, env| quest.end(outcome, true, true, env))?
    }

    /// Queues a signal for delivery on the next step.
    pub fn publish(&mut self, signal: Signal) {
        self.host.dispatcher.publish(signal);
    }

    /// Creates a subquest of `parent` from the catalogue script `script`.
    /// The subquest starts accepted when its parent is ongoing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::QuestNotFound` for an unknown parent and
    /// `DomainError::Validation` for an unknown script.
    pub fn create_subquest(
        &mut self,
        parent: QuestId,
        script: &str,
    ) -> Result<QuestId, DomainError> {
        let parent_state = self
            .quest(parent)
            .map(Quest::state)
            .ok_or(DomainError::QuestNotFound(parent))?;
        let id = self.allocate_id();
        let quest = self
            .catalogue
            .build(script, id, self.tick, &mut self.host.world)?
            .with_parent(parent);
        self.add_quest(quest)?;
        if parent_state == QuestState::Ongoing {
            self.accept_initially(id)?;
        }
        tracing::info!(quest_id = %id, %parent, script, "subquest created");
        Ok(id)
    }

    /// Destroys `entity` and tells every quest it is gone.
    pub fn discard_entity(&mut self, entity: EntityHandle) -> bool {
        let destroyed = self.host.world.destroy(entity);
        if destroyed {
            self.fan_out_discarded();
        }
        destroyed
    }

    // --- driving ---

    /// Runs one tick: every quest ticks, then queued signals are drained
    /// within the budget.
    pub fn step(&mut self) -> StepReport {
        let mut report = StepReport {
            tick: self.tick,
            ..StepReport::default()
        };
        {
            let Self {
                quests,
                host,
                catalogue,
                tick,
                ..
            } = self;
            let directory = DirectorySnapshot::capture(quests, catalogue);
            for quest in quests.iter_mut() {
                let mut env = host.env(*tick, &directory);
                report.faults += quest.quest_tick(&mut env).faults.len();
            }
        }
        self.settle(&mut report);
        self.tick += 1;
        report
    }

    /// Runs `ticks` steps and sums their reports.
    pub fn run(&mut self, ticks: i64) -> StepReport {
        let mut totals = StepReport {
            tick: self.tick,
            ..StepReport::default()
        };
        for _ in 0..ticks {
            totals.absorb(self.step());
        }
        totals
    }

    fn settle(&mut self, report: &mut StepReport) {
        let mut budget = self.signal_budget;
        loop {
            self.fan_out_discarded();
            report.subquests_created += self.spawn_requested_subquests();
            if budget == 0 {
                break;
            }
            let Some(signal) = self.host.dispatcher.pop() else {
                break;
            };
            budget -= 1;
            report.signals_delivered += 1;
            report.faults += self.deliver(&signal);
        }
        report.signals_deferred = self.host.dispatcher.len();
        if report.signals_deferred > 0 {
            tracing::warn!(
                tick = self.tick,
                deferred = report.signals_deferred,
                budget = self.signal_budget,
                "signal budget exhausted; remaining signals deferred"
            );
        }
    }

    fn deliver(&mut self, signal: &Signal) -> usize {
        let Self {
            quests,
            host,
            catalogue,
            tick,
            ..
        } = self;
        let directory = DirectorySnapshot::capture(quests, catalogue);
        let mut faults = 0;
        for quest in quests.iter_mut() {
            if !signal.is_relevant_to(quest.id()) {
                continue;
            }
            let mut env = host.env(*tick, &directory);
            faults += quest.notify_signal_received(signal, &mut env).faults.len();
        }
        faults
    }

    fn spawn_requested_subquests(&mut self) -> usize {
        let requests: Vec<(QuestId, String)> = self
            .quests
            .iter_mut()
            .flat_map(|quest| {
                let parent = quest.id();
                quest
                    .take_subquest_requests()
                    .into_iter()
                    .map(move |script| (parent, script))
            })
            .collect();
        let mut created = 0;
        for (parent, script) in requests {
            match self.create_subquest(parent, &script) {
                Ok(_) => created += 1,
                Err(err) => {
                    tracing::error!(%parent, %script, error = %err, "subquest creation failed");
                }
            }
        }
        created
    }

    fn fan_out_discarded(&mut self) {
        for (entity, label) in self.host.world.take_discarded() {
            tracing::debug!(%entity, %label, "entity discarded");
            for quest in &mut self.quests {
                quest.notify_entity_discarded(entity, Some(&label));
            }
        }
    }

    fn with_quest<R>(
        &mut self,
        id: QuestId,
        op: impl FnOnce(&mut Quest, &mut QuestEnv<'_>) -> R,
    ) -> Result<R, DomainError> {
        let Self {
            quests,
            host,
            catalogue,
            tick,
            ..
        } = self;
        let directory = DirectorySnapshot::capture(quests, catalogue);
        let quest = quests
            .iter_mut()
            .find(|quest| quest.id() == id)
            .ok_or(DomainError::QuestNotFound(id))?;
        let mut env = host.env(*tick, &directory);
        Ok(op(quest, &mut env))
    }

    // --- queries ---

    /// Whether any quest reserves `entity`.
    #[must_use]
    pub fn is_reserved(&self, entity: EntityHandle) -> bool {
        self.quests.iter().any(|quest| quest.quest_reserves(entity))
    }

    /// Ids of the quests reserving `entity`, in registry order.
    #[must_use]
    pub fn reserving_quests(&self, entity: EntityHandle) -> Vec<QuestId> {
        self.quests
            .iter()
            .filter(|quest| quest.quest_reserves(entity))
            .map(Quest::id)
            .collect()
    }

    /// Ids of the subquests of `parent`, in registry order.
    #[must_use]
    pub fn subquests_of(&self, parent: QuestId) -> Vec<QuestId> {
        self.quests
            .iter()
            .filter(|quest| quest.parent() == Some(parent))
            .map(Quest::id)
            .collect()
    }

    /// Incidents due within `horizon` ticks, earliest first.
    #[must_use]
    pub fn upcoming_incidents(&self, horizon: i64) -> Vec<IncidentEvent> {
        let until = self.tick + horizon;
        let mut events: Vec<IncidentEvent> = self
            .quests
            .iter()
            .flat_map(|quest| quest.incident_schedules(self.tick))
            .flat_map(|schedule| schedule.take_while(move |event| event.fire_tick <= until))
            .collect();
        events.sort_by_key(|event| (event.fire_tick, event.quest_id));
        events
    }

    // --- persistence ---

    /// Saves every quest through `repo`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if encoding or the repository write fails.
    pub async fn save(
        &self,
        clock: &dyn Clock,
        repo: &dyn SaveRepository,
    ) -> Result<StoredSnapshot, DomainError> {
        handle_save_quests(&self.quests, self.tick, self.next_quest_id, clock, repo).await
    }

    /// Replaces the quests with the latest save in `repo`, resolving entity
    /// references against the current world. Returns `false` when there is
    /// no save.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the read fails or the save cannot be
    /// restored.
    pub async fn load(&mut self, repo: &dyn SaveRepository) -> Result<bool, DomainError> {
        let Some(loaded) = handle_load_quests(repo, &self.host.world).await? else {
            return Ok(false);
        };
        self.restore(loaded);
        Ok(true)
    }

    /// Installs a loaded game. The id counter is bumped past every loaded id.
    pub fn restore(&mut self, loaded: LoadedGame) {
        let highest = loaded
            .quests
            .iter()
            .map(|quest| quest.id().0.saturating_add(1))
            .max()
            .unwrap_or(1);
        self.next_quest_id = loaded.next_quest_id.max(highest);
        self.tick = loaded.tick;
        self.quests = loaded.quests;
        tracing::info!(
            tick = self.tick,
            quests = self.quests.len(),
            missing = loaded.missing.len(),
            next_quest_id = self.next_quest_id,
            "game restored"
        );
    }
}

#[cfg(test)]
mod tests {
    use questline_core::signal::SignalArgs;
    use questline_engine::domain::activable::Activable;
    use questline_engine::domain::parts::{DelayPart, QuestEndPart, SubquestGeneratorPart};

    use super::*;

    fn errand(id: QuestId, tick: i64, _world: &mut SandboxWorld) -> Result<Quest, DomainError> {
        let mut quest = Quest::new(id, "Errand", tick);
        quest.add_part(Box::new(QuestEndPart::new(
            id.scoped_tag("Done"),
            EndOutcome::Success,
        )))?;
        Ok(quest)
    }

    fn manager() -> QuestManager {
        QuestManager::new(
            SandboxWorld::new(8, 8),
            ScriptCatalogue::new().with("errand", errand),
            7,
        )
    }

    #[test]
    fn test_add_quest_announces_it_on_next_step() {
        // Arrange
        let mut manager = manager();
        let id = manager.allocate_id();
        manager.add_quest(Quest::new(id, "Watch", 0)).unwrap();

        // Act
        let report = manager.step();

        // Assert
        assert_eq!(report.signals_delivered, 1);
        assert_eq!(manager.tick(), 1);
        assert_eq!(manager.pending_signals(), 0);
    }

    #[test]
    fn test_duplicate_quest_id_is_rejected() {
        // Arrange
        let mut manager = manager();
        manager.add_quest(Quest::new(QuestId(3), "A", 0)).unwrap();

        // Act
        let result = manager.add_quest(Quest::new(QuestId(3), "B", 0));

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(manager.allocate_id(), QuestId(4));
    }

    #[test]
    fn test_quest_id_without_successor_is_rejected() {
        // Arrange
        let mut manager = manager();

        // Act
        let result = manager.add_quest(Quest::new(QuestId(u64::MAX), "Edge", 0));

        // Assert
        match result {
            Err(DomainError::Validation(message)) => assert!(message.contains("out of range")),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(manager.quests().is_empty());
        assert_eq!(manager.allocate_id(), QuestId(1));
    }

    #[test]
    fn test_unknown_quest_operations_are_not_found() {
        // Arrange
        let mut manager = manager();

        // Act
        let result = manager.accept(QuestId(9), None);

        // Assert
        match result {
            Err(DomainError::QuestNotFound(id)) => assert_eq!(id, QuestId(9)),
            other => panic!("expected QuestNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_scoped_signal_reaches_only_its_quest() {
        // Arrange
        let mut manager = manager();
        let first = manager.allocate_id();
        let second = manager.allocate_id();
        for id in [first, second] {
            let quest = errand(id, 0, &mut SandboxWorld::new(1, 1)).unwrap();
            manager.add_quest(quest).unwrap();
            manager.accept(id, None).unwrap();
        }
        manager.publish(Signal::for_quest(second, "Done"));

        // Act
        manager.step();

        // Assert
        assert_eq!(manager.quest(first).unwrap().state(), QuestState::Ongoing);
        assert_eq!(manager.quest(second).unwrap().state(), QuestState::EndedSuccess);
    }

    #[test]
    fn test_budget_defers_remaining_signals() {
        // Arrange
        let mut manager = manager().with_signal_budget(2);
        for n in 0..5 {
            manager.publish(Signal::global(format!("Noise{n}"), SignalArgs::new()));
        }

        // Act
        let first = manager.step();
        let second = manager.step();

        // Assert
        assert_eq!(first.signals_delivered, 2);
        assert_eq!(first.signals_deferred, 3);
        assert_eq!(second.signals_delivered, 2);
        assert_eq!(manager.pending_signals(), 1);
    }

    #[test]
    fn test_generator_requests_become_accepted_subquests() {
        // Arrange
        let mut manager = manager();
        let parent = manager.allocate_id();
        let mut quest = Quest::new(parent, "Patron", 0);
        quest
            .add_part(Box::new(
                SubquestGeneratorPart::new(vec!["errand".to_owned()], 1).with_limits(1, 1),
            ))
            .unwrap();
        manager.add_quest(quest).unwrap();
        manager.accept(parent, None).unwrap();

        // Act
        let report = manager.run(3);

        // Assert
        assert_eq!(report.subquests_created, 1);
        let children = manager.subquests_of(parent);
        assert_eq!(children.len(), 1);
        let child = manager.quest(children[0]).unwrap();
        assert_eq!(child.state(), QuestState::Ongoing);
        assert_eq!(child.script(), Some("errand"));
        assert!(child.initially_accepted());
    }

    #[test]
    fn test_parent_completes_after_subquest_succeeds() {
        // Arrange
        let mut manager = manager();
        let parent = manager.allocate_id();
        let mut quest = Quest::new(parent, "Patron", 0);
        quest
            .add_part(Box::new(
                SubquestGeneratorPart::new(vec!["errand".to_owned()], 1)
                    .with_limits(1, 1)
                    .with_activable(
                        Activable::new().ending_quest_on_complete(EndOutcome::Success),
                    ),
            ))
            .unwrap();
        manager.add_quest(quest).unwrap();
        manager.accept(parent, None).unwrap();
        manager.run(2);
        let child = manager.subquests_of(parent)[0];

        // Act
        manager.publish(Signal::for_quest(child, "Done"));
        manager.run(2);

        // Assert
        assert_eq!(manager.quest(child).unwrap().state(), QuestState::EndedSuccess);
        assert_eq!(manager.quest(parent).unwrap().state(), QuestState::EndedSuccess);
        assert_eq!(manager.letters().outcomes().get("success"), Some(&2));
    }

    #[test]
    fn test_subquest_of_unknown_parent_is_rejected() {
        // Arrange
        let mut manager = manager();

        // Act
        let result = manager.create_subquest(QuestId(42), "errand");

        // Assert
        assert!(matches!(result, Err(DomainError::QuestNotFound(_))));
        assert!(manager.quests().is_empty());
    }

    #[test]
    fn test_destroyed_expiry_target_is_fanned_out() {
        // Arrange
        let beacon = EntityHandle::thing(1);
        let mut manager = manager();
        manager.world_mut().add(beacon, "beacon");
        let id = manager.allocate_id();
        let mut quest = Quest::new(id, "Beacon", 0);
        quest
            .add_part(Box::new(DelayPart::new(2).expiring(beacon, "Fades in")))
            .unwrap();
        manager.add_quest(quest).unwrap();

        // Act
        manager.run(3);

        // Assert
        assert!(!manager.world().exists(beacon));
        assert!(manager.quest(id).unwrap().look_targets().is_empty());
    }

    #[test]
    fn test_restore_bumps_id_counter_past_loaded_quests() {
        // Arrange
        let mut manager = manager();
        let loaded = LoadedGame {
            tick: 50,
            next_quest_id: 2,
            quests: vec![Quest::new(QuestId(9), "Old", 0)],
            missing: Vec::new(),
        };

        // Act
        manager.restore(loaded);

        // Assert
        assert_eq!(manager.tick(), 50);
        assert_eq!(manager.allocate_id(), QuestId(10));
    }
}
