//! Save snapshots, where they are kept, and the wall clock that stamps them.
//!
//! Simulation time is the integer tick carried by the engine environment;
//! wall-clock time only ever appears in `StoredSnapshot::saved_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a save snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// Unique snapshot identifier.
    pub snapshot_id: Uuid,
    /// Layout version of `payload`.
    pub format_version: u32,
    /// Simulation tick at which the snapshot was taken.
    pub tick: i64,
    /// Wall-clock time of the save.
    pub saved_at: DateTime<Utc>,
    /// Serialized game payload.
    pub payload: serde_json::Value,
}

/// Repository trait for persisting save snapshots.
///
/// Saving and loading happen between ticks, never inside one.
#[async_trait]
pub trait SaveRepository: Send + Sync {
    /// Loads the most recent snapshot, if any.
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError>;

    /// Persists a snapshot, replacing the previous one.
    async fn save(&self, snapshot: &StoredSnapshot) -> Result<(), DomainError>;
}

/// Source of `saved_at` stamps. Tests pin it.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the host's real-time clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
