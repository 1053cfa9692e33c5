//! The sandbox scenario: a small outpost, its quest scripts and the quests
//! a fresh game starts with.

use questline_core::entity::EntityHandle;
use questline_core::error::DomainError;
use questline_core::identity::QuestId;
use questline_core::world::Cell;
use questline_engine::domain::activable::Activable;
use questline_engine::domain::parts::{
    DelayPart, PawnFilterPart, QuestEndPart, SignalRelayPart, SpawnPart, SubquestGeneratorPart,
    ThreatParams, ThreatsGeneratorPart,
};
use questline_engine::domain::quest::Quest;
use questline_engine::domain::state::EndOutcome;

use crate::catalogue::ScriptCatalogue;
use crate::manager::QuestManager;
use crate::world::SandboxWorld;

/// Script: a crate lands near the first colonist after a short delay.
pub const SUPPLY_DROP: &str = "supply_drop";

/// Script: a raider pod lands and has to be held off for a while.
pub const BANDIT_RAID: &str = "bandit_raid";

/// First colonist.
pub const ANA: EntityHandle = EntityHandle::pawn(1);

/// Second colonist.
pub const BORIS: EntityHandle = EntityHandle::pawn(2);

/// The faction trading with the outpost.
pub const OUTLANDERS: EntityHandle = EntityHandle::faction(1);

/// The faction behind the outpost's threat cycle.
pub const RAIDERS: EntityHandle = EntityHandle::faction(2);

/// A beacon the offered quest destroys when its delay runs out.
pub const BEACON: EntityHandle = EntityHandle::thing(1);

/// Entities created by a script are numbered from the owning quest id, so
/// handles never collide across quests or across resumed runs.
fn scoped_entity(quest: QuestId, n: u64) -> u64 {
    1_000 + quest.0 * 100 + n
}

/// The outpost map with its two colonists and the beacon.
#[must_use]
pub fn build_world() -> SandboxWorld {
    let mut world = SandboxWorld::new(32, 32).with_landing_zone(Cell::new(16, 2));
    world.add_at(ANA, "Ana", Cell::new(10, 10));
    world.add_at(BORIS, "Boris", Cell::new(11, 10));
    world.add(OUTLANDERS, "Outlanders");
    world.add(RAIDERS, "Rust Raiders");
    world.add_at(BEACON, "signal beacon", Cell::new(20, 20));
    world
}

/// Every script the scenario can generate.
#[must_use]
pub fn catalogue() -> ScriptCatalogue {
    ScriptCatalogue::new()
        .with(SUPPLY_DROP, supply_drop)
        .with(BANDIT_RAID, bandit_raid)
}

/// A manager over a fresh outpost.
#[must_use]
pub fn manager(seed: u64) -> QuestManager {
    QuestManager::new(build_world(), catalogue(), seed)
}

fn supply_drop(id: QuestId, tick: i64, world: &mut SandboxWorld) -> Result<Quest, DomainError> {
    let supplies = EntityHandle::thing(scoped_entity(id, 1));
    world.add(supplies, "supply crate");
    let mut quest = Quest::new(id, "Supply drop", tick)
        .with_description("A trader's crate is on its way.")
        .with_points(50.0)
        .with_tag("supply")
        .hiding_on_cleanup();
    quest.add_part(Box::new(DelayPart::new(120).with_activable(
        Activable::new().signalling_on_complete(id.scoped_tag("Drop")),
    )))?;
    quest.add_part(Box::new(
        SpawnPart::new(id.scoped_tag("Drop"), supplies)
            .with_strategies(SpawnPart::default_strategies(None, Some(ANA)))
            .signalling(id.scoped_tag("Landed")),
    ))?;
    quest.add_part(Box::new(QuestEndPart::new(
        id.scoped_tag("Landed"),
        EndOutcome::Success,
    )))?;
    Ok(quest)
}

fn bandit_raid(id: QuestId, tick: i64, world: &mut SandboxWorld) -> Result<Quest, DomainError> {
    let pod = EntityHandle::transport(scoped_entity(id, 1));
    let raider = EntityHandle::pawn(scoped_entity(id, 2));
    world.add(pod, "raider pod");
    world.add_inside(pod, raider, "raider");
    let mut quest = Quest::new(id, "Bandit raid", tick)
        .with_points(200.0)
        .with_tag("threat");
    quest.add_part(Box::new(SignalRelayPart::new(
        quest.initiate_signal(),
        vec![id.scoped_tag("Arrive")],
    )))?;
    quest.add_part(Box::new(
        SpawnPart::new(id.scoped_tag("Arrive"), pod)
            .tracking_inner()
            .signalling(id.scoped_tag("Landed")),
    ))?;
    quest.add_part(Box::new(DelayPart::new(400).with_activable(
        Activable::new().ending_quest_on_complete(EndOutcome::Success),
    )))?;
    Ok(quest)
}

/// Adds the quests a fresh game starts with: the outpost defence (accepted,
/// generating subquests and threats), an envoy escort accepted by Boris, and
/// an expiring beacon offer.
///
/// # Errors
///
/// Returns `DomainError` if a quest cannot be assembled or registered.
pub fn seed_quests(manager: &mut QuestManager, seed: u64) -> Result<Vec<QuestId>, DomainError> {
    let defence = manager.allocate_id();
    let mut quest = Quest::new(defence, "Hold the outpost", manager.tick())
        .with_description("Keep the outpost supplied and standing.")
        .with_points(500.0)
        .with_tag("main");
    quest.add_part(Box::new(
        SubquestGeneratorPart::new(vec![SUPPLY_DROP.to_owned(), BANDIT_RAID.to_owned()], 500)
            .with_limits(1, 4)
            .with_activable(Activable::new().ending_quest_on_complete(EndOutcome::Success)),
    ))?;
    quest.add_part(Box::new(
        ThreatsGeneratorPart::new(ThreatParams {
            seed,
            ..ThreatParams::default()
        })
        .from_faction(RAIDERS),
    ))?;
    manager.add_quest(quest)?;
    manager.accept(defence, Some(ANA))?;

    let escort = manager.allocate_id();
    let envoy = EntityHandle::pawn(scoped_entity(escort, 1));
    manager.world_mut().add(envoy, "Outlander envoy");
    let mut quest = Quest::new(escort, "Envoy escort", manager.tick())
        .with_tag("diplomacy")
        .with_acceptance_expiry(3_000);
    quest.add_part(Box::new(SignalRelayPart::new(
        quest.initiate_signal(),
        vec![escort.scoped_tag("Arrive")],
    )))?;
    quest.add_part(Box::new(
        SpawnPart::new(escort.scoped_tag("Arrive"), envoy)
            .with_strategies(SpawnPart::default_strategies(None, Some(BORIS)))
            .signalling(escort.scoped_tag("Arrived")),
    ))?;
    let mut gathering = PawnFilterPart::new(2)
        .adding_on(escort.scoped_tag("Arrived"))
        .with_activable(Activable::new().signalling_on_complete(escort.scoped_tag("Gathered")));
    gathering.add_pawn(BORIS);
    quest.add_part(Box::new(gathering))?;
    quest.add_part(Box::new(QuestEndPart::new(
        escort.scoped_tag("Gathered"),
        EndOutcome::Success,
    )))?;
    manager.add_quest(quest)?;
    manager.accept(escort, Some(BORIS))?;

    let beacon = manager.allocate_id();
    let mut quest = Quest::new(beacon, "Strange beacon", manager.tick())
        .with_tag("mystery")
        .with_acceptance_expiry(1_500);
    quest.add_part(Box::new(
        DelayPart::new(600).expiring(BEACON, "Beacon fades in"),
    ))?;
    manager.add_quest(quest)?;

    tracing::info!(defence = %defence, escort = %escort, beacon = %beacon, "scenario seeded");
    Ok(vec![defence, escort, beacon])
}

#[cfg(test)]
mod tests {
    use questline_core::world::WorldAccess;
    use questline_engine::domain::state::QuestState;

    use super::*;

    #[test]
    fn test_seeded_scenario_starts_with_two_running_quests_and_an_offer() {
        // Arrange
        let mut manager = manager(1);

        // Act
        let ids = seed_quests(&mut manager, 1).unwrap();

        // Assert
        let states: Vec<QuestState> = ids
            .iter()
            .map(|id| manager.quest(*id).unwrap().state())
            .collect();
        assert_eq!(
            states,
            vec![
                QuestState::Ongoing,
                QuestState::Ongoing,
                QuestState::NotYetAccepted
            ]
        );
        let defence = manager.quest(ids[0]).unwrap();
        assert_eq!(defence.involved_factions(), vec![RAIDERS]);
        assert!(manager.is_reserved(RAIDERS));
        assert!(!manager.is_reserved(OUTLANDERS));
    }

    #[test]
    fn test_envoy_arrives_and_escort_succeeds() {
        // Arrange
        let mut manager = manager(1);
        let ids = seed_quests(&mut manager, 1).unwrap();
        let escort = ids[1];

        // Act
        manager.run(3);

        // Assert
        let envoy = EntityHandle::pawn(scoped_entity(escort, 1));
        assert!(manager.world().position(envoy).is_some());
        assert_eq!(manager.quest(escort).unwrap().state(), QuestState::EndedSuccess);
    }

    #[test]
    fn test_beacon_offer_destroys_beacon_then_expires() {
        // Arrange
        let mut manager = manager(1);
        let ids = seed_quests(&mut manager, 1).unwrap();
        let beacon = ids[2];

        // Act
        manager.run(601);
        let beacon_gone = !manager.world().exists(BEACON);
        manager.run(1_000);

        // Assert
        assert!(beacon_gone);
        assert_eq!(
            manager.quest(beacon).unwrap().state(),
            QuestState::EndedOfferExpired
        );
    }

    #[test]
    fn test_raid_script_loads_pod_with_raider() {
        // Arrange
        let mut world = build_world();

        // Act
        let quest = bandit_raid(QuestId(4), 10, &mut world).unwrap();

        // Assert
        let pod = EntityHandle::transport(scoped_entity(QuestId(4), 1));
        assert_eq!(quest.part_count(), 3);
        assert_eq!(
            world.contents(pod),
            vec![EntityHandle::pawn(scoped_entity(QuestId(4), 2))]
        );
    }
}
