//! Integration tests driving the sandbox scenario through `QuestManager`.

mod common;

use questline_core::entity::EntityHandle;
use questline_core::signal::Signal;
use questline_core::world::WorldAccess;
use questline_engine::domain::parts::SpawnPart;
use questline_engine::domain::quest::Quest;
use questline_engine::domain::state::QuestState;
use questline_sim::manager::QuestManager;
use questline_sim::scenario::{self, BEACON, BORIS};
use questline_test_support::InMemorySaveRepository;

#[test]
fn test_outpost_defence_generates_subquests_over_a_long_run() {
    // Arrange
    let mut manager = scenario::manager(7);
    let ids = scenario::seed_quests(&mut manager, 7).unwrap();
    let defence = ids[0];

    // Act
    let report = manager.run(3_000);

    // Assert
    let children = manager.subquests_of(defence);
    assert_eq!(report.faults, 0);
    assert!(!children.is_empty());
    assert_eq!(report.subquests_created, children.len());
    for child in children {
        let quest = manager.quest(child).unwrap();
        assert_eq!(quest.parent(), Some(defence));
        assert!(quest.script().is_some());
    }
}

#[test]
fn test_escort_reserves_boris_until_it_ends() {
    // Arrange
    let mut manager = scenario::manager(7);
    let ids = scenario::seed_quests(&mut manager, 7).unwrap();

    // Act
    let before = manager.reserving_quests(BORIS);
    manager.run(5);

    // Assert
    assert_eq!(before, vec![ids[1]]);
    assert!(!manager.is_reserved(BORIS));
}

#[test]
fn test_discarding_an_entity_reaches_every_quest() {
    // Arrange
    let mut manager = scenario::manager(7);
    let ids = scenario::seed_quests(&mut manager, 7).unwrap();
    let beacon_offer = ids[2];

    // Act
    let destroyed = manager.discard_entity(BEACON);
    let again = manager.discard_entity(BEACON);

    // Assert
    assert!(destroyed);
    assert!(!again);
    assert!(!manager.world().exists(BEACON));
    assert!(
        manager
            .quest(beacon_offer)
            .unwrap()
            .look_targets()
            .is_empty()
    );
}

#[test]
fn test_dismissed_offer_still_expires() {
    // Arrange
    let mut manager = scenario::manager(7);
    let ids = scenario::seed_quests(&mut manager, 7).unwrap();
    let offer = ids[2];

    // Act
    manager.dismiss(offer).unwrap();
    manager.run(1_500);

    // Assert
    let quest = manager.quest(offer).unwrap();
    assert!(quest.dismissed());
    assert_eq!(quest.state(), QuestState::EndedOfferExpired);
    assert!(quest.cleaned_up());
}

#[tokio::test]
async fn test_save_and_load_round_trip_through_manager() {
    // Arrange
    let repo = InMemorySaveRepository::new();
    let mut original = scenario::manager(7);
    scenario::seed_quests(&mut original, 7).unwrap();
    original.run(50);
    original.save(&common::fixed_clock(), &repo).await.unwrap();

    // Act
    let mut restored = scenario::manager(7);
    let loaded = restored.load(&repo).await.unwrap();

    // Assert
    assert!(loaded);
    assert_eq!(restored.tick(), 50);
    assert_eq!(restored.quests().len(), original.quests().len());
    let states = |manager: &QuestManager| {
        manager
            .quests()
            .iter()
            .map(Quest::state)
            .collect::<Vec<_>>()
    };
    assert_eq!(states(&restored), states(&original));
    let next = restored.allocate_id();
    assert!(original.quests().iter().all(|quest| quest.id() < next));
}

#[tokio::test]
async fn test_reload_after_discard_drops_references_the_new_world_lacks() {
    // Arrange
    let repo = InMemorySaveRepository::new();
    let pod = EntityHandle::transport(900);
    let raider = EntityHandle::pawn(901);
    let mut original = scenario::manager(7);
    original.world_mut().add(pod, "raider pod");
    original.world_mut().add_inside(pod, raider, "raider");
    let id = original.allocate_id();
    let mut quest = Quest::new(id, "Pod landing", 0);
    quest
        .add_part(Box::new(SpawnPart::new(id.scoped_tag("Arrive"), pod).tracking_inner()))
        .unwrap();
    original.add_quest(quest).unwrap();
    original.accept(id, None).unwrap();
    original.publish(Signal::for_quest(id, "Arrive"));
    original.run(2);
    let tracked_before = original.quest(id).unwrap().look_targets();
    original.discard_entity(raider);
    let tracked_after_discard = original.quest(id).unwrap().look_targets();
    original.save(&common::fixed_clock(), &repo).await.unwrap();

    // Act
    let mut restored = scenario::manager(7);
    let loaded = restored.load(&repo).await.unwrap();

    // Assert
    assert!(loaded);
    assert_eq!(tracked_before, vec![raider]);
    assert_eq!(tracked_after_discard, vec![pod]);
    assert!(original.is_reserved(pod));
    let quest = restored.quest(id).unwrap();
    assert_eq!(quest.state(), QuestState::Ongoing);
    assert!(quest.look_targets().is_empty());
    assert!(quest.select_targets().is_empty());
    assert!(!restored.is_reserved(pod));
}
