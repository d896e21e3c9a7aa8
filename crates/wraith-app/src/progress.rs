//! JSON file progress store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use wraith_core::error::CoreError;
use wraith_core::progress::{ProgressRecord, ProgressStore};

/// Stores the progress record as a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileProgressStore {
    path: PathBuf,
}

impl JsonFileProgressStore {
    /// Store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProgressStore for JsonFileProgressStore {
    async fn load(&self) -> Result<Option<ProgressRecord>, CoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::Persistence(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        let record = serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::Persistence(format!("corrupt save file {}: {e}", self.path.display()))
        })?;
        Ok(Some(record))
    }

    async fn save(&self, record: &ProgressRecord) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|e| CoreError::Persistence(format!("failed to encode progress: {e}")))?;

        // Staged write, then rename over the target.
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await.map_err(|e| {
            CoreError::Persistence(format!("failed to write {}: {e}", staging.display()))
        })?;
        tokio::fs::rename(&staging, &self.path).await.map_err(|e| {
            CoreError::Persistence(format!("failed to replace {}: {e}", self.path.display()))
        })?;

        debug!(act = record.act, path = %self.path.display(), "progress saved");
        Ok(())
    }
}
