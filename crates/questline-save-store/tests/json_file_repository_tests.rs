//! Integration tests for `JsonFileSaveRepository`.

use chrono::{TimeZone, Utc};
use questline_core::error::DomainError;
use questline_core::repository::{SaveRepository, StoredSnapshot};
use questline_save_store::JsonFileSaveRepository;
use uuid::Uuid;

/// Helper to build a `StoredSnapshot` with sensible defaults.
fn make_snapshot(tick: i64) -> StoredSnapshot {
    StoredSnapshot {
        snapshot_id: Uuid::new_v4(),
        format_version: 1,
        tick,
        saved_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        payload: serde_json::json!({"quests": [], "tick": tick}),
    }
}

// --- load_latest ---

#[tokio::test]
async fn test_load_latest_returns_none_when_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileSaveRepository::new(dir.path().join("save.json"));

    let loaded = repo.load_latest().await.unwrap();

    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_load_latest_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");
    std::fs::write(&path, "{ not json").unwrap();
    let repo = JsonFileSaveRepository::new(&path);

    let result = repo.load_latest().await;

    assert!(matches!(result, Err(DomainError::Serialization(_))));
}

// --- save + load_latest round-trip ---

#[tokio::test]
async fn test_save_then_load_round_trips_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileSaveRepository::new(dir.path().join("nested/dir/save.json"));
    let snapshot = make_snapshot(42);

    repo.save(&snapshot).await.unwrap();
    let loaded = repo.load_latest().await.unwrap();

    assert_eq!(loaded, Some(snapshot));
}

#[tokio::test]
async fn test_second_save_replaces_first_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");
    let repo = JsonFileSaveRepository::new(&path);

    repo.save(&make_snapshot(1)).await.unwrap();
    let latest = make_snapshot(2);
    repo.save(&latest).await.unwrap();

    let loaded = repo.load_latest().await.unwrap().unwrap();
    assert_eq!(loaded.tick, 2);
    assert_eq!(loaded.snapshot_id, latest.snapshot_id);
    assert!(!dir.path().join("save.json.tmp").exists());
}
