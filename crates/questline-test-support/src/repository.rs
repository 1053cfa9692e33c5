//! Test repositories: `SaveRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use questline_core::error::DomainError;
use questline_core::repository::{SaveRepository, StoredSnapshot};

/// Keeps the latest snapshot in memory and counts saves.
#[derive(Debug, Default)]
pub struct InMemorySaveRepository {
    latest: Mutex<Option<StoredSnapshot>>,
    saves: Mutex<usize>,
}

impl InMemorySaveRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository pre-seeded with `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: StoredSnapshot) -> Self {
        Self {
            latest: Mutex::new(Some(snapshot)),
            saves: Mutex::new(0),
        }
    }

    /// The stored snapshot, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn latest(&self) -> Option<StoredSnapshot> {
        self.latest.lock().unwrap().clone()
    }

    /// Number of successful `save` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl SaveRepository for InMemorySaveRepository {
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        Ok(self.latest.lock().unwrap().clone())
    }

    async fn save(&self, snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        *self.latest.lock().unwrap() = Some(snapshot.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Never holds a snapshot and silently accepts saves. Useful for "fresh
/// start" scenarios.
#[derive(Debug)]
pub struct EmptySaveRepository;

#[async_trait]
impl SaveRepository for EmptySaveRepository {
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Always returns an infrastructure error. Useful for testing error paths.
#[derive(Debug)]
pub struct FailingSaveRepository;

#[async_trait]
impl SaveRepository for FailingSaveRepository {
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        Err(DomainError::Infrastructure("disk unavailable".into()))
    }

    async fn save(&self, _snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("disk unavailable".into()))
    }
}
