//! Pawn-count filter part.

use questline_core::entity::{EntityHandle, ReferenceResolver};
use questline_core::signal::{Signal, SignalArgs};
use serde::{Deserialize, Serialize};

use super::SUBJECT_ARG;
use crate::domain::activable::Activable;
use crate::domain::part::{PartBase, PartContext, PartError, PartResult, QuestPart};
use crate::domain::record::PartRecord;

/// Tracks a pawn set and completes once at least `required` of them are
/// capable.
///
/// Pawns join and leave through `in_signal_add` / `in_signal_remove`, each
/// carrying the pawn as its `SUBJECT` argument. The predicate is recomputed
/// every tick while Enabled. Tracked pawns are reserved only until the
/// filter completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PawnFilterPart {
    /// Shared part state.
    #[serde(default)]
    pub base: PartBase,
    /// Enabled/Disabled sub-machine.
    #[serde(default)]
    pub activable: Activable,
    /// Tracked pawns, in join order.
    #[serde(default)]
    pub pawns: Vec<EntityHandle>,
    /// Capable pawns needed to complete.
    pub required: usize,
    /// Tag adding its `SUBJECT` to the set.
    #[serde(default)]
    pub in_signal_add: Option<String>,
    /// Tag removing its `SUBJECT` from the set.
    #[serde(default)]
    pub in_signal_remove: Option<String>,
}

impl PawnFilterPart {
    /// Requires `required` capable pawns.
    #[must_use]
    pub fn new(required: usize) -> Self {
        Self {
            base: PartBase::default(),
            activable: Activable::new(),
            pawns: Vec::new(),
            required,
            in_signal_add: None,
            in_signal_remove: None,
        }
    }

    /// Uses `activable` as the sub-machine.
    #[must_use]
    pub fn with_activable(mut self, activable: Activable) -> Self {
        self.activable = activable;
        self
    }

    /// Listens for pawns joining on `tag`.
    #[must_use]
    pub fn adding_on(mut self, tag: impl Into<String>) -> Self {
        self.in_signal_add = Some(tag.into());
        self
    }

    /// Listens for pawns leaving on `tag`.
    #[must_use]
    pub fn removing_on(mut self, tag: impl Into<String>) -> Self {
        self.in_signal_remove = Some(tag.into());
        self
    }

    /// Adds a pawn unless already tracked.
    pub fn add_pawn(&mut self, pawn: EntityHandle) {
        if !self.pawns.contains(&pawn) {
            self.pawns.push(pawn);
        }
    }

    /// Stops tracking a pawn.
    pub fn remove_pawn(&mut self, pawn: EntityHandle) {
        self.pawns.retain(|tracked| *tracked != pawn);
    }

    fn subject(signal: &Signal) -> Result<EntityHandle, PartError> {
        let value = signal
            .args()
            .get(SUBJECT_ARG)
            .ok_or_else(|| PartError::BadArgument {
                name: SUBJECT_ARG.to_owned(),
                reason: format!("missing on {}", signal.tag()),
            })?;
        EntityHandle::from_arg(value).ok_or_else(|| PartError::BadArgument {
            name: SUBJECT_ARG.to_owned(),
            reason: format!("not an entity handle: {value}"),
        })
    }
}

impl QuestPart for PawnFilterPart {
    fn kind(&self) -> &'static str {
        "pawn_filter"
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

    fn on_signal(&mut self, signal: &Signal, _ctx: &mut PartContext<'_, '_>) -> PartResult {
        if self.in_signal_add.as_deref() == Some(signal.tag()) {
            self.add_pawn(Self::subject(signal)?);
        } else if self.in_signal_remove.as_deref() == Some(signal.tag()) {
            self.remove_pawn(Self::subject(signal)?);
        }
        Ok(())
    }

    fn tick(&mut self, ctx: &mut PartContext<'_, '_>) -> PartResult {
        let world = ctx.world();
        let capable = self
            .pawns
            .iter()
            .filter(|pawn| world.is_capable(**pawn))
            .count();
        if capable >= self.required {
            tracing::debug!(quest_id = %ctx.quest_id(), capable, required = self.required, "pawn filter satisfied");
            self.activable.complete(ctx, SignalArgs::new());
        }
        Ok(())
    }

    fn look_targets(&self) -> Vec<EntityHandle> {
        self.pawns.clone()
    }

    fn select_targets(&self) -> Vec<EntityHandle> {
        self.pawns.clone()
    }

    fn reserves(&self, entity: EntityHandle) -> bool {
        self.activable.is_enabled() && self.pawns.contains(&entity)
    }

    fn on_entity_discarded(&mut self, entity: EntityHandle) {
        self.remove_pawn(entity);
    }

    fn resolve_references(&mut self, resolver: &mut ReferenceResolver<'_>) {
        resolver.resolve_all(&mut self.pawns);
    }

    fn to_record(&self) -> PartRecord {
        PartRecord::PawnFilter(self.clone())
    }
}
