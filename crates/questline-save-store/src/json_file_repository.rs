//! JSON-file implementation of the `SaveRepository` trait.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use questline_core::error::DomainError;
use questline_core::repository::{SaveRepository, StoredSnapshot};

/// Keeps the latest snapshot in a single JSON file.
///
/// Writes go to a sibling `*.tmp` file that is then renamed over the target,
/// so a crash mid-write leaves the previous save intact.
#[derive(Debug, Clone)]
pub struct JsonFileSaveRepository {
    path: PathBuf,
}

impl JsonFileSaveRepository {
    /// Creates a repository backed by `path`. Nothing is touched until the
    /// first load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The save file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> DomainError {
    DomainError::Infrastructure(format!("{action} {} failed: {e}", path.display()))
}

#[async_trait]
impl SaveRepository for JsonFileSaveRepository {
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("reading", &self.path, &e)),
        };
        let snapshot = serde_json::from_str(&content).map_err(|e| {
            DomainError::Serialization(format!(
                "save file {} is corrupt: {e}",
                self.path.display()
            ))
        })?;
        tracing::debug!(path = %self.path.display(), "save file read");
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| DomainError::Serialization(format!("snapshot encoding failed: {e}")))?;
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("creating", parent, &e))?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| io_error("writing", &temp, &e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| io_error("replacing", &self.path, &e))?;
        tracing::debug!(
            path = %self.path.display(),
            snapshot_id = %snapshot.snapshot_id,
            "save file written"
        );
        Ok(())
    }
}
