//! Threat-generator part and its lazy incident schedule.

use questline_core::entity::{EntityHandle, ReferenceResolver};
use questline_core::identity::QuestId;
use questline_core::rng::{DeterministicRng, SeededRng};
use serde::{Deserialize, Serialize};

use crate::domain::activable::Activable;
use crate::domain::part::{PartBase, QuestPart};
use crate::domain::record::PartRecord;

/// Parameters of a threat cycle.
///
/// Incidents only fire inside "on" windows of `on_ticks`, separated by
/// quiet windows of `off_ticks`. Consecutive incidents are spaced by a
/// uniform draw from `min_spacing_ticks..=max_spacing_ticks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatParams {
    /// Length of an active window.
    pub on_ticks: u32,
    /// Length of a quiet window. Zero means always active.
    pub off_ticks: u32,
    /// Shortest gap between incidents.
    pub min_spacing_ticks: u32,
    /// Longest gap between incidents.
    pub max_spacing_ticks: u32,
    /// Smallest incident strength.
    pub min_points: f64,
    /// Largest incident strength.
    pub max_points: f64,
    /// Seed mixed with the quest id.
    pub seed: u64,
}

impl Default for ThreatParams {
    fn default() -> Self {
        Self {
            on_ticks: 60_000,
            off_ticks: 60_000,
            min_spacing_ticks: 10_000,
            max_spacing_ticks: 30_000,
            min_points: 100.0,
            max_points: 500.0,
            seed: 0,
        }
    }
}

/// One scheduled incident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncidentEvent {
    /// Quest the incident belongs to.
    pub quest_id: QuestId,
    /// Tick it should fire at.
    pub fire_tick: i64,
    /// Incident strength.
    pub points: f64,
}

/// Unbounded, lazily generated sequence of incidents.
///
/// Nothing is precomputed; each `next` draws one spacing and one strength.
#[derive(Debug, Clone)]
pub struct IncidentSchedule {
    quest_id: QuestId,
    params: ThreatParams,
    rng: SeededRng,
    origin: i64,
    cursor: i64,
}

impl IncidentSchedule {
    /// A schedule whose cycle starts at `origin`.
    #[must_use]
    pub fn new(quest_id: QuestId, params: ThreatParams, origin: i64) -> Self {
        let rng = SeededRng::new(params.seed ^ quest_id.0.rotate_left(32));
        Self {
            quest_id,
            params,
            rng,
            origin,
            cursor: origin,
        }
    }

    fn snap_to_active_window(&self, tick: i64) -> i64 {
        let on = i64::from(self.params.on_ticks.max(1));
        let cycle = on + i64::from(self.params.off_ticks);
        let phase = (tick - self.origin).rem_euclid(cycle);
        if phase < on {
            tick
        } else {
            tick + (cycle - phase)
        }
    }
}

impl Iterator for IncidentSchedule {
    type Item = IncidentEvent;

    fn next(&mut self) -> Option<IncidentEvent> {
        let min = self.params.min_spacing_ticks.max(1);
        let max = self.params.max_spacing_ticks.max(min);
        let spacing = i64::from(self.rng.next_u32_range(min, max));
        let fire_tick = self.snap_to_active_window(self.cursor + spacing);
        self.cursor = fire_tick;
        let span = (self.params.max_points - self.params.min_points).max(0.0);
        let points = self.params.min_points + span * self.rng.next_f64();
        Some(IncidentEvent {
            quest_id: self.quest_id,
            fire_tick,
            points,
        })
    }
}

/// Offers an [`IncidentSchedule`] to an external scheduler while Enabled.
///
/// The part never ticks; disabling it (via the activable control signal)
/// withdraws the schedule. The attacking faction, if set, is reported as
/// involved and stays reserved while the schedule is on offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatsGeneratorPart {
    /// Shared part state.
    #[serde(default)]
    pub base: PartBase,
    /// Enabled/Disabled sub-machine.
    #[serde(default)]
    pub activable: Activable,
    /// Cycle parameters.
    pub params: ThreatParams,
    /// Faction behind the incidents.
    #[serde(default)]
    pub faction: Option<EntityHandle>,
}

impl ThreatsGeneratorPart {
    /// A generator with `params`.
    #[must_use]
    pub fn new(params: ThreatParams) -> Self {
        Self {
            base: PartBase::default(),
            activable: Activable::new(),
            params,
            faction: None,
        }
    }

    /// Attributes the incidents to `faction`.
    #[must_use]
    pub fn from_faction(mut self, faction: EntityHandle) -> Self {
        self.faction = Some(faction);
        self
    }

    /// Uses `activable` as the sub-machine.
    #[must_use]
    pub fn with_activable(mut self, activable: Activable) -> Self {
        self.activable = activable;
        self
    }
}

impl QuestPart for ThreatsGeneratorPart {
    fn kind(&self) -> &'static str {
        "threats_generator"
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

    fn involved_factions(&self) -> Vec<EntityHandle> {
        self.faction.into_iter().collect()
    }

    fn reserves(&self, entity: EntityHandle) -> bool {
        self.activable.is_enabled() && self.faction == Some(entity)
    }

    fn on_entity_discarded(&mut self, entity: EntityHandle) {
        if self.faction == Some(entity) {
            self.faction = None;
        }
    }

    fn resolve_references(&mut self, resolver: &mut ReferenceResolver<'_>) {
        resolver.resolve_opt(&mut self.faction);
    }

    fn incident_schedule(&self, quest_id: QuestId, from_tick: i64) -> Option<IncidentSchedule> {
        self.activable
            .is_enabled()
            .then(|| IncidentSchedule::new(quest_id, self.params.clone(), from_tick))
    }

    fn to_record(&self) -> PartRecord {
        PartRecord::ThreatsGenerator(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ThreatParams {
        ThreatParams {
            on_ticks: 100,
            off_ticks: 100,
            min_spacing_ticks: 30,
            max_spacing_ticks: 60,
            min_points: 50.0,
            max_points: 150.0,
            seed: 42,
        }
    }

    #[test]
    fn test_schedule_is_deterministic_per_seed_and_quest() {
        // Arrange
        let first = IncidentSchedule::new(QuestId(3), params(), 0);
        let second = IncidentSchedule::new(QuestId(3), params(), 0);

        // Act
        let a: Vec<IncidentEvent> = first.take(20).collect();
        let b: Vec<IncidentEvent> = second.take(20).collect();

        // Assert
        assert_eq!(a, b);
    }

    #[test]
    fn test_incidents_fall_inside_active_windows_in_order() {
        // Arrange
        let schedule = IncidentSchedule::new(QuestId(1), params(), 1_000);

        // Act
        let events: Vec<IncidentEvent> = schedule.take(50).collect();

        // Assert
        let mut previous = 1_000;
        for event in &events {
            assert!(event.fire_tick > previous);
            assert!((event.fire_tick - 1_000).rem_euclid(200) < 100);
            assert!((50.0..=150.0).contains(&event.points));
            previous = event.fire_tick;
        }
    }

    #[test]
    fn test_disabled_generator_offers_no_schedule() {
        // Arrange
        let mut part = ThreatsGeneratorPart::new(params());
        part.activable.disable_at(5);

        // Act
        let schedule = part.incident_schedule(QuestId(1), 0);

        // Assert
        assert!(schedule.is_none());
    }

    #[test]
    fn test_faction_is_involved_and_reserved_while_enabled() {
        // Arrange
        let raiders = EntityHandle::faction(2);
        let mut part = ThreatsGeneratorPart::new(params()).from_faction(raiders);

        // Act
        let reserved_while_enabled = part.reserves(raiders);
        part.activable.disable_at(10);

        // Assert
        assert!(reserved_while_enabled);
        assert!(!part.reserves(raiders));
        assert_eq!(part.involved_factions(), vec![raiders]);
    }

    #[test]
    fn test_discarded_faction_is_forgotten() {
        // Arrange
        let raiders = EntityHandle::faction(2);
        let mut part = ThreatsGeneratorPart::new(params()).from_faction(raiders);

        // Act
        part.on_entity_discarded(raiders);

        // Assert
        assert!(part.involved_factions().is_empty());
        assert!(!part.reserves(raiders));
    }
}
