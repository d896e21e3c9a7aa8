//! Progress persistence abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Persisted record of narrative progress, written on every phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Current act number (1 through 4; 5 once the story has ended).
    pub act: u8,
    /// When the record was written.
    pub saved_at: DateTime<Utc>,
}

/// Collaborator that records the current act for crash recovery.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Loads the last saved record, or `None` on a fresh start.
    async fn load(&self) -> Result<Option<ProgressRecord>, CoreError>;

    /// Saves a record, replacing any previous one.
    async fn save(&self, record: &ProgressRecord) -> Result<(), CoreError>;
}
