//! Save and load handlers.
//!
//! Saving captures every quest as a record and writes one versioned snapshot
//! through the repository. Loading runs both phases: records become quests,
//! then every entity handle is checked against the live registry.

use questline_core::aggregate::PersistentAggregate;
use questline_core::entity::{EntityHandle, EntityRegistry, ReferenceResolver};
use questline_core::error::DomainError;
use questline_core::repository::{Clock, SaveRepository, StoredSnapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::quest::Quest;
use crate::domain::record::{CustomPartFactory, NoCustomParts, QuestRecord};

/// Layout version of [`SaveGame`].
pub const SAVE_FORMAT_VERSION: u32 = 1;

/// Payload of a save snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    /// Layout version.
    pub format_version: u32,
    /// Simulation tick of the save.
    pub tick: i64,
    /// Next quest id the driver would hand out.
    pub next_quest_id: u64,
    /// Every quest, live and historical, in registry order.
    pub quests: Vec<QuestRecord>,
}

/// Result of a completed two-phase load.
#[derive(Debug)]
pub struct LoadedGame {
    /// Simulation tick of the save.
    pub tick: i64,
    /// Next quest id to hand out.
    pub next_quest_id: u64,
    /// Restored quests, references resolved.
    pub quests: Vec<Quest>,
    /// Handles that no longer exist and were replaced with `None`.
    pub missing: Vec<EntityHandle>,
}

/// Captures `quests` as a snapshot stamped by `clock`.
///
/// # Errors
///
/// Returns `DomainError::Serialization` if the payload cannot be encoded.
pub fn build_snapshot(
    quests: &[Quest],
    tick: i64,
    next_quest_id: u64,
    clock: &dyn Clock,
) -> Result<StoredSnapshot, DomainError> {
    let game = SaveGame {
        format_version: SAVE_FORMAT_VERSION,
        tick,
        next_quest_id,
        quests: quests.iter().map(PersistentAggregate::to_record).collect(),
    };
    let payload = serde_json::to_value(&game)
        .map_err(|e| DomainError::Serialization(format!("save encoding failed: {e}")))?;
    Ok(StoredSnapshot {
        snapshot_id: Uuid::new_v4(),
        format_version: SAVE_FORMAT_VERSION,
        tick,
        saved_at: clock.now(),
        payload,
    })
}

/// Rebuilds quests from `snapshot` and resolves their references.
///
/// One resolver spans every quest, so a handle missing from several quests
/// is logged once.
///
/// # Errors
///
/// Returns `DomainError::Serialization` if the snapshot is from a newer
/// layout, the payload does not decode, or a part cannot be rebuilt.
pub fn restore_snapshot(
    snapshot: &StoredSnapshot,
    registry: &dyn EntityRegistry,
    factory: &dyn CustomPartFactory,
) -> Result<LoadedGame, DomainError> {
    if snapshot.format_version > SAVE_FORMAT_VERSION {
        return Err(DomainError::Serialization(format!(
            "save format {} is newer than supported {SAVE_FORMAT_VERSION}",
            snapshot.format_version
        )));
    }
    let game: SaveGame = serde_json::from_value(snapshot.payload.clone())
        .map_err(|e| DomainError::Serialization(format!("save decoding failed: {e}")))?;

    let mut quests = game
        .quests
        .into_iter()
        .map(|record| Quest::from_record_with(record, factory))
        .collect::<Result<Vec<_>, _>>()?;

    let mut resolver = ReferenceResolver::new(registry);
    for quest in &mut quests {
        quest.resolve_references(&mut resolver);
    }
    let missing = resolver.missing();

    Ok(LoadedGame {
        tick: game.tick,
        next_quest_id: game.next_quest_id,
        quests,
        missing,
    })
}

/// Saves every quest through `repo`.
///
/// # Errors
///
/// Returns `DomainError` if encoding or the repository write fails.
pub async fn handle_save_quests(
    quests: &[Quest],
    tick: i64,
    next_quest_id: u64,
    clock: &dyn Clock,
    repo: &dyn SaveRepository,
) -> Result<StoredSnapshot, DomainError> {
    let snapshot = build_snapshot(quests, tick, next_quest_id, clock)?;
    repo.save(&snapshot).await?;
    tracing::info!(
        snapshot_id = %snapshot.snapshot_id,
        tick,
        quests = quests.len(),
        "quests saved"
    );
    Ok(snapshot)
}

/// Loads the latest snapshot from `repo`, if there is one.
///
/// # Errors
///
/// Returns `DomainError` if the repository read fails or the snapshot
/// cannot be restored.
pub async fn handle_load_quests(
    repo: &dyn SaveRepository,
    registry: &dyn EntityRegistry,
) -> Result<Option<LoadedGame>, DomainError> {
    let Some(snapshot) = repo.load_latest().await? else {
        tracing::info!("no save found; starting fresh");
        return Ok(None);
    };
    let loaded = restore_snapshot(&snapshot, registry, &NoCustomParts)?;
    tracing::info!(
        snapshot_id = %snapshot.snapshot_id,
        tick = loaded.tick,
        quests = loaded.quests.len(),
        missing = loaded.missing.len(),
        "quests loaded"
    );
    Ok(Some(loaded))
}
