//! Dispatch engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Sizing and shutdown bounds for the dispatch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Number of workers; fixed for the engine's lifetime.
    pub workers: usize,
    /// How long `join` waits for workers after `shutdown`.
    #[serde(with = "duration_millis")]
    pub join_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            join_timeout: Duration::from_secs(2),
        }
    }
}

impl DispatchConfig {
    /// Config with `workers` workers and default timeouts.
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Checks the config before any worker is spawned.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Configuration` if `workers` is zero.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.workers == 0 {
            return Err(EngineError::Configuration(
                "worker pool needs at least one worker".to_owned(),
            ));
        }
        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
