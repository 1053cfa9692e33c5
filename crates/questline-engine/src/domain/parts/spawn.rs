//! Spawner part: places a pre-built entity when its trigger arrives.

use questline_core::entity::{EntityHandle, EntityKind, ReferenceResolver};
use questline_core::signal::{Signal, SignalArgs};
use questline_core::world::{Cell, PlacementStrategy};
use serde::{Deserialize, Serialize};

use super::SUBJECT_ARG;
use crate::domain::part::{PartBase, PartContext, PartError, PartResult, QuestPart};
use crate::domain::record::PartRecord;
use crate::domain::state::QuestState;

/// Places `thing` once, on `in_signal`.
///
/// The location comes from the first strategy in `strategies` that the world
/// can satisfy; [`PlacementStrategy::Anywhere`] is always tried last. When
/// `track_inner` is set and the placed thing is a container, its first inner
/// entity becomes a look target.
///
/// A placed pawn or transport stays reserved while the quest runs. If the
/// quest ends without succeeding, cleanup withdraws the placed thing from
/// the world unless `keep_on_failure` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnPart {
    /// Shared part state.
    #[serde(default)]
    pub base: PartBase,
    /// Trigger tag.
    pub in_signal: String,
    /// The entity to place.
    pub thing: Option<EntityHandle>,
    /// Placement fallback chain, in priority order.
    pub strategies: Vec<PlacementStrategy>,
    /// Track the container's inner entity after placement.
    #[serde(default)]
    pub track_inner: bool,
    /// Tag published after placement, with the thing as `SUBJECT`.
    #[serde(default)]
    pub out_signal_spawned: Option<String>,
    /// Leave the placed thing in the world when the quest fails or expires.
    #[serde(default)]
    pub keep_on_failure: bool,
    #[serde(default)]
    spawned_at: Option<Cell>,
    #[serde(default)]
    inner: Option<EntityHandle>,
}

impl SpawnPart {
    /// Spawns `thing` on `in_signal` using [`SpawnPart::default_strategies`]
    /// with no explicit cell or anchor.
    #[must_use]
    pub fn new(in_signal: impl Into<String>, thing: EntityHandle) -> Self {
        Self {
            base: PartBase::default(),
            in_signal: in_signal.into(),
            thing: Some(thing),
            strategies: Self::default_strategies(None, None),
            track_inner: false,
            out_signal_spawned: None,
            keep_on_failure: false,
            spawned_at: None,
            inner: None,
        }
    }

    /// Explicit cell, landing zone, near an anchor, then a safe-spot search.
    #[must_use]
    pub fn default_strategies(
        cell: Option<Cell>,
        anchor: Option<EntityHandle>,
    ) -> Vec<PlacementStrategy> {
        let mut strategies = Vec::with_capacity(4);
        if let Some(cell) = cell {
            strategies.push(PlacementStrategy::ExplicitCell { cell });
        }
        strategies.push(PlacementStrategy::LandingZone);
        if let Some(anchor) = anchor {
            strategies.push(PlacementStrategy::NearEntity { anchor });
        }
        strategies.push(PlacementStrategy::SafeSpot);
        strategies
    }

    /// Replaces the fallback chain.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<PlacementStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Tracks the placed container's inner entity.
    #[must_use]
    pub fn tracking_inner(mut self) -> Self {
        self.track_inner = true;
        self
    }

    /// Publishes `tag` once placed.
    #[must_use]
    pub fn signalling(mut self, tag: impl Into<String>) -> Self {
        self.out_signal_spawned = Some(tag.into());
        self
    }

    /// Leaves the placed thing behind whatever the outcome.
    #[must_use]
    pub fn keeping_on_failure(mut self) -> Self {
        self.keep_on_failure = true;
        self
    }

    /// Where the thing was placed, once it has been.
    #[must_use]
    pub fn spawned_at(&self) -> Option<Cell> {
        self.spawned_at
    }

    /// The tracked inner entity.
    #[must_use]
    pub fn inner(&self) -> Option<EntityHandle> {
        self.inner
    }

    fn place(&mut self, thing: EntityHandle, ctx: &mut PartContext<'_, '_>) -> PartResult {
        let world = ctx.world();
        let fallback = [PlacementStrategy::Anywhere];
        let placed = self
            .strategies
            .iter()
            .chain(fallback.iter())
            .find_map(|strategy| {
                let cell = world.find_cell(strategy, thing)?;
                world.place(thing, cell).then_some((strategy.clone(), cell))
            });
        let Some((strategy, cell)) = placed else {
            return Err(PartError::Placement { entity: thing });
        };
        self.spawned_at = Some(cell);
        if self.track_inner {
            self.inner = world.contents(thing).first().copied();
        }
        tracing::info!(
            quest_id = %ctx.quest_id(),
            %thing,
            x = cell.x,
            z = cell.z,
            strategy = ?strategy,
            "thing spawned"
        );
        if let Some(tag) = &self.out_signal_spawned {
            ctx.publish(Signal::new(
                tag.clone(),
                SignalArgs::new().with(SUBJECT_ARG, thing.to_arg()),
            ));
        }
        Ok(())
    }
}

impl QuestPart for SpawnPart {
    fn kind(&self) -> &'static str {
        "spawn"
    }

    fn base(&self) -> &PartBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn on_signal(&mut self, signal: &Signal, ctx: &mut PartContext<'_, '_>) -> PartResult {
        if signal.tag() != self.in_signal || self.spawned_at.is_some() {
            return Ok(());
        }
        match self.thing {
            Some(thing) => self.place(thing, ctx),
            None => {
                tracing::warn!(quest_id = %ctx.quest_id(), "spawn triggered but thing is gone");
                Ok(())
            }
        }
    }

    fn cleanup(&mut self, ctx: &mut PartContext<'_, '_>) -> PartResult {
        let state = ctx.quest_state();
        if self.keep_on_failure || self.spawned_at.is_none() || state == QuestState::EndedSuccess {
            return Ok(());
        }
        let Some(thing) = self.thing.take() else {
            return Ok(());
        };
        self.inner = None;
        if ctx.world().destroy(thing) {
            tracing::info!(
                quest_id = %ctx.quest_id(),
                %thing,
                state = state.as_str(),
                "spawned thing withdrawn"
            );
        }
        Ok(())
    }

    fn reserves(&self, entity: EntityHandle) -> bool {
        self.spawned_at.is_some()
            && self.thing == Some(entity)
            && matches!(entity.kind, EntityKind::Pawn | EntityKind::Transport)
    }

    fn affects_population(&self) -> bool {
        self.thing.is_some_and(|thing| thing.kind == EntityKind::Pawn)
    }

    fn look_targets(&self) -> Vec<EntityHandle> {
        if self.spawned_at.is_none() {
            return Vec::new();
        }
        self.inner.or(self.thing).into_iter().collect()
    }

    fn select_targets(&self) -> Vec<EntityHandle> {
        if self.spawned_at.is_none() {
            return Vec::new();
        }
        self.thing.into_iter().collect()
    }

    fn on_entity_discarded(&mut self, entity: EntityHandle) {
        if self.thing == Some(entity) {
            self.thing = None;
        }
        if self.inner == Some(entity) {
            self.inner = None;
        }
    }

    fn resolve_references(&mut self, resolver: &mut ReferenceResolver<'_>) {
        // Not yet placed means the thing lives outside the world; keep it.
        if self.spawned_at.is_some() {
            resolver.resolve_opt(&mut self.thing);
        }
        resolver.resolve_opt(&mut self.inner);
    }

    fn to_record(&self) -> PartRecord {
        PartRecord::Spawn(self.clone())
    }
}
