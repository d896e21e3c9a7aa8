//! Wake interval computation.

use std::time::Duration;

use wraith_core::rng::DeterministicRng;

use crate::config::HeartbeatConfig;

/// Computes the next sleep.
///
/// `base(idle) / chaos`, plus Gaussian jitter, floored at the minimum; then,
/// with the configured probability, a uniform "false calm" extra delay.
/// Draw order: two floats for the jitter, one for the false-calm chance, and
/// one more for its length when it fires.
pub fn compute_interval(
    config: &HeartbeatConfig,
    idle_secs: f64,
    chaos_multiplier: f64,
    rng: &mut dyn DeterministicRng,
) -> Duration {
    let chaos = if chaos_multiplier > 0.0 {
        chaos_multiplier
    } else {
        1.0
    };
    let base = config.base_interval(idle_secs) / chaos;
    let mut secs = rng
        .next_gaussian(base, config.jitter_std_dev)
        .max(config.min_interval);

    if rng.chance(config.false_calm_probability) {
        secs += rng.next_f64_range(config.false_calm_min, config.false_calm_max);
    }

    Duration::from_secs_f64(secs)
}
