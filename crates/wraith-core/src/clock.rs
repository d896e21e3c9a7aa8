//! Clock abstraction for determinism.

use chrono::{DateTime, Utc};

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Seconds elapsed between `earlier` and now, never negative.
    #[allow(clippy::cast_precision_loss)]
    fn seconds_since(&self, earlier: DateTime<Utc>) -> f64 {
        let elapsed = self.now() - earlier;
        (elapsed.num_milliseconds().max(0) as f64) / 1000.0
    }
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
