//! Heartbeat cadence constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Every tunable of the heartbeat loop. Times are in seconds unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Idle time after which the player counts as long gone.
    pub long_idle_secs: f64,
    /// Idle time after which the player counts as idle.
    pub short_idle_secs: f64,
    /// Base interval when long idle.
    pub long_idle_interval: f64,
    /// Base interval when idle.
    pub short_idle_interval: f64,
    /// Base interval when the player is active.
    pub active_interval: f64,
    /// Standard deviation of the Gaussian jitter.
    pub jitter_std_dev: f64,
    /// Floor applied after jitter.
    pub min_interval: f64,
    /// Chance of adding a "false calm" delay.
    pub false_calm_probability: f64,
    /// Shortest false calm.
    pub false_calm_min: f64,
    /// Longest false calm.
    pub false_calm_max: f64,
    /// Chance a triggered wake issues a generation request.
    pub generation_probability: f64,
    /// Chance a triggered wake emits a burst instead of one action.
    pub burst_probability: f64,
    /// Fewest commands in a burst.
    pub burst_min: u32,
    /// Most commands in a burst.
    pub burst_max: u32,
    /// Gap between burst commands.
    pub burst_spacing: Duration,
    /// How long `stop` waits for the loop to exit.
    pub stop_timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            long_idle_secs: 120.0,
            short_idle_secs: 60.0,
            long_idle_interval: 6.0,
            short_idle_interval: 10.0,
            active_interval: 15.0,
            jitter_std_dev: 1.5,
            min_interval: 2.0,
            false_calm_probability: 0.08,
            false_calm_min: 10.0,
            false_calm_max: 20.0,
            generation_probability: 0.08,
            burst_probability: 0.12,
            burst_min: 2,
            burst_max: 3,
            burst_spacing: Duration::from_millis(500),
            stop_timeout: Duration::from_secs(2),
        }
    }
}

impl HeartbeatConfig {
    /// Base interval for `idle_secs` of inactivity.
    #[must_use]
    pub fn base_interval(&self, idle_secs: f64) -> f64 {
        if idle_secs > self.long_idle_secs {
            self.long_idle_interval
        } else if idle_secs > self.short_idle_secs {
            self.short_idle_interval
        } else {
            self.active_interval
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_interval_shrinks_with_idle_time() {
        let config = HeartbeatConfig::default();

        assert!((config.base_interval(0.0) - 15.0).abs() < f64::EPSILON);
        assert!((config.base_interval(60.0) - 15.0).abs() < f64::EPSILON);
        assert!((config.base_interval(60.5) - 10.0).abs() < f64::EPSILON);
        assert!((config.base_interval(120.0) - 10.0).abs() < f64::EPSILON);
        assert!((config.base_interval(121.0) - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: HeartbeatConfig =
            serde_json::from_str(r#"{ "active_interval": 30.0 }"#).unwrap();

        assert!((config.active_interval - 30.0).abs() < f64::EPSILON);
        assert!((config.min_interval - 2.0).abs() < f64::EPSILON);
    }
}
