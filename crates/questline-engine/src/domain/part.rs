//! The behavior-unit capability contract.
//!
//! A part overrides only the hooks it needs; every hook has a no-op default.
//! Parts never see their owning quest directly. During a hook they receive a
//! [`PartContext`] through which they read the quest's id and state, publish
//! signals, reach world services, and request quest-level effects. The quest
//! applies those requests once the hook has returned.

use std::fmt;

use questline_core::directory::QuestDirectory;
use questline_core::entity::{EntityHandle, ReferenceResolver};
use questline_core::identity::{PartId, QuestId};
use questline_core::rng::DeterministicRng;
use questline_core::signal::Signal;
use questline_core::world::WorldAccess;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::activable::Activable;
use super::env::QuestEnv;
use super::parts::threats_generator::IncidentSchedule;
use super::record::PartRecord;
use super::state::{EndOutcome, QuestState, SignalListenMode};

/// Error returned by a part hook.
#[derive(Debug, Error)]
pub enum PartError {
    /// Generic runtime fault inside a part.
    #[error("{0}")]
    Fault(String),

    /// No placement strategy produced a usable cell.
    #[error("no placement found for {entity}")]
    Placement {
        /// The entity that could not be placed.
        entity: EntityHandle,
    },

    /// A signal carried an argument the part could not use.
    #[error("bad signal argument `{name}`: {reason}")]
    BadArgument {
        /// Argument name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type of every part hook.
pub type PartResult = Result<(), PartError>;

/// State shared by every part: owner back-reference, id and listen mode.
///
/// The owner is a plain id, never a pointer; it is set when the part is
/// attached and cleared when it is detached. It does not influence the part's
/// lifetime, which ends only when the owning quest drops it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartBase {
    #[serde(skip)]
    owner: Option<QuestId>,
    #[serde(skip)]
    id: Option<PartId>,
    /// Which quest states allow this part to hear signals.
    #[serde(default)]
    pub listen_mode: SignalListenMode,
}

impl PartBase {
    /// Base with the given listen mode.
    #[must_use]
    pub fn with_listen_mode(listen_mode: SignalListenMode) -> Self {
        Self {
            owner: None,
            id: None,
            listen_mode,
        }
    }

    /// The owning quest, if attached.
    #[must_use]
    pub fn owner(&self) -> Option<QuestId> {
        self.owner
    }

    /// The part's id within its owner, if attached.
    #[must_use]
    pub fn id(&self) -> Option<PartId> {
        self.id
    }

    pub(crate) fn attach(&mut self, owner: QuestId, id: PartId) {
        self.owner = Some(owner);
        self.id = Some(id);
    }

    pub(crate) fn detach(&mut self) {
        self.owner = None;
        self.id = None;
    }
}

/// A quest-level effect requested by a part.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestRequest {
    /// End the owning quest.
    End {
        /// Outcome to record.
        outcome: EndOutcome,
        /// Whether an outcome letter should be requested.
        send_letter: bool,
    },
    /// Generate a subquest from the named script.
    GenerateSubquest {
        /// Script name.
        script: String,
    },
}

/// Per-hook view handed to a part.
pub struct PartContext<'e, 'a> {
    quest_id: QuestId,
    part_id: PartId,
    state: QuestState,
    env: &'e mut QuestEnv<'a>,
    requests: Vec<QuestRequest>,
}

impl<'e, 'a> PartContext<'e, 'a> {
    pub(crate) fn new(
        quest_id: QuestId,
        part_id: PartId,
        state: QuestState,
        env: &'e mut QuestEnv<'a>,
    ) -> Self {
        Self {
            quest_id,
            part_id,
            state,
            env,
            requests: Vec::new(),
        }
    }

    /// Current simulation tick.
    #[must_use]
    pub fn tick(&self) -> i64 {
        self.env.tick
    }

    /// The owning quest's id.
    #[must_use]
    pub fn quest_id(&self) -> QuestId {
        self.quest_id
    }

    /// This part's id.
    #[must_use]
    pub fn part_id(&self) -> PartId {
        self.part_id
    }

    /// The owning quest's state when the hook was entered.
    #[must_use]
    pub fn quest_state(&self) -> QuestState {
        self.state
    }

    /// Publishes a signal through the dispatcher.
    pub fn publish(&mut self, signal: Signal) {
        tracing::debug!(
            quest_id = %self.quest_id,
            part_id = %self.part_id,
            tag = signal.tag(),
            "part published signal"
        );
        self.env.dispatcher.publish(signal);
    }

    /// World services.
    pub fn world(&mut self) -> &mut dyn WorldAccess {
        &mut *self.env.world
    }

    /// Lookups over other quests.
    #[must_use]
    pub fn directory(&self) -> &dyn QuestDirectory {
        self.env.directory
    }

    /// Randomness.
    pub fn rng(&mut self) -> &mut dyn DeterministicRng {
        &mut *self.env.rng
    }

    /// Asks the owning quest to end once this hook returns.
    pub fn end_quest(&mut self, outcome: EndOutcome, send_letter: bool) {
        self.requests.push(QuestRequest::End {
            outcome,
            send_letter,
        });
    }

    /// Asks the driver to generate a subquest of the owning quest.
    pub fn generate_subquest(&mut self, script: impl Into<String>) {
        self.requests.push(QuestRequest::GenerateSubquest {
            script: script.into(),
        });
    }

    pub(crate) fn into_requests(self) -> Vec<QuestRequest> {
        self.requests
    }
}

impl fmt::Debug for PartContext<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartContext")
            .field("quest_id", &self.quest_id)
            .field("part_id", &self.part_id)
            .field("state", &self.state)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

/// A behavior unit owned by exactly one quest.
pub trait QuestPart: fmt::Debug + Send {
    /// Stable kind name, used in logs and records.
    fn kind(&self) -> &'static str;

    /// Shared base state.
    fn base(&self) -> &PartBase;

    /// Shared base state, mutably.
    fn base_mut(&mut self) -> &mut PartBase;

    /// The Enabled/Disabled sub-machine, for activable parts.
    fn activable(&self) -> Option<&Activable> {
        None
    }

    /// The Enabled/Disabled sub-machine, mutably.
    fn activable_mut(&mut self) -> Option<&mut Activable> {
        None
    }

    /// Runs just before the owning quest is accepted.
    ///
    /// # Errors
    ///
    /// A returned error is logged by the quest and does not stop acceptance.
    fn pre_accept(&mut self, _ctx: &mut PartContext<'_, '_>) -> PartResult {
        Ok(())
    }

    /// Handles a signal the listen mode let through.
    ///
    /// # Errors
    ///
    /// A returned error is logged by the quest; other parts still receive
    /// the signal.
    fn on_signal(&mut self, _signal: &Signal, _ctx: &mut PartContext<'_, '_>) -> PartResult {
        Ok(())
    }

    /// Per-tick work. Only called on activable parts that are Enabled.
    ///
    /// # Errors
    ///
    /// A returned error is logged by the quest; other parts still tick.
    fn tick(&mut self, _ctx: &mut PartContext<'_, '_>) -> PartResult {
        Ok(())
    }

    /// First cleanup pass.
    ///
    /// # Errors
    ///
    /// A returned error is logged; cleanup continues.
    fn pre_cleanup(&mut self, _ctx: &mut PartContext<'_, '_>) -> PartResult {
        Ok(())
    }

    /// Second cleanup pass.
    ///
    /// # Errors
    ///
    /// A returned error is logged; cleanup continues.
    fn cleanup(&mut self, _ctx: &mut PartContext<'_, '_>) -> PartResult {
        Ok(())
    }

    /// Entities the player should be able to jump to.
    fn look_targets(&self) -> Vec<EntityHandle> {
        Vec::new()
    }

    /// Entities the player should be able to select.
    fn select_targets(&self) -> Vec<EntityHandle> {
        Vec::new()
    }

    /// Factions this part involves.
    fn involved_factions(&self) -> Vec<EntityHandle> {
        Vec::new()
    }

    /// Whether this part reserves the given pawn, faction or transport.
    fn reserves(&self, _entity: EntityHandle) -> bool {
        false
    }

    /// Extra line for the inspect pane of `target`.
    fn inspect_string(&self, _target: EntityHandle) -> Option<String> {
        None
    }

    /// Whether this part changes colony population.
    fn affects_population(&self) -> bool {
        false
    }

    /// Lazy incident schedule, for parts that generate threats.
    fn incident_schedule(&self, _quest_id: QuestId, _from_tick: i64) -> Option<IncidentSchedule> {
        None
    }

    /// Seeds placeholder data for debug-spawned quests.
    fn assign_debug_data(&mut self) {}

    /// An entity this part may reference was removed from the world.
    fn on_entity_discarded(&mut self, _entity: EntityHandle) {}

    /// Phase two of loading: resolve stored handles.
    fn resolve_references(&mut self, _resolver: &mut ReferenceResolver<'_>) {}

    /// Captures the part as a persisted record.
    fn to_record(&self) -> PartRecord;
}
