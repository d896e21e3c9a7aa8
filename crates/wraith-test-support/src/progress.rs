//! Test progress stores — mock `ProgressStore` implementations for tests.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use wraith_core::error::CoreError;
use wraith_core::progress::{ProgressRecord, ProgressStore};

/// A progress store that keeps records in memory and remembers every save.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    initial: Option<ProgressRecord>,
    saved: Mutex<Vec<ProgressRecord>>,
}

impl InMemoryProgressStore {
    /// Creates a store with nothing saved.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose first `load` returns `record`.
    #[must_use]
    pub fn with_record(record: ProgressRecord) -> Self {
        Self {
            initial: Some(record),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every saved record, oldest first.
    pub fn saved(&self) -> Vec<ProgressRecord> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the acts saved, oldest first.
    pub fn saved_acts(&self) -> Vec<u8> {
        self.saved().into_iter().map(|r| r.act).collect()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn load(&self) -> Result<Option<ProgressRecord>, CoreError> {
        let saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(saved.last().cloned().or_else(|| self.initial.clone()))
    }

    async fn save(&self, record: &ProgressRecord) -> Result<(), CoreError> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// A progress store that always fails. Useful for testing that persistence
/// errors never stall the narrative.
#[derive(Debug)]
pub struct FailingProgressStore;

#[async_trait]
impl ProgressStore for FailingProgressStore {
    async fn load(&self) -> Result<Option<ProgressRecord>, CoreError> {
        Err(CoreError::Persistence("disk unavailable".into()))
    }

    async fn save(&self, _record: &ProgressRecord) -> Result<(), CoreError> {
        Err(CoreError::Persistence("disk unavailable".into()))
    }
}

/// A progress store whose saves take a while, or never finish. Saves that do
/// finish land in the wrapped in-memory store.
#[derive(Debug)]
pub struct SlowProgressStore {
    delay: Option<Duration>,
    inner: Arc<InMemoryProgressStore>,
}

impl SlowProgressStore {
    /// Every save sleeps for `delay` before it is recorded.
    #[must_use]
    pub fn delayed(delay: Duration, inner: Arc<InMemoryProgressStore>) -> Self {
        Self {
            delay: Some(delay),
            inner,
        }
    }

    /// Every save waits forever.
    #[must_use]
    pub fn stalled() -> Self {
        Self {
            delay: None,
            inner: Arc::new(InMemoryProgressStore::new()),
        }
    }
}

#[async_trait]
impl ProgressStore for SlowProgressStore {
    async fn load(&self) -> Result<Option<ProgressRecord>, CoreError> {
        self.inner.load().await
    }

    async fn save(&self, record: &ProgressRecord) -> Result<(), CoreError> {
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
        self.inner.save(record).await
    }
}
