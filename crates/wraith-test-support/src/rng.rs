//! Test RNG — deterministic `DeterministicRng` implementations for tests.

use wraith_core::rng::DeterministicRng;

/// A no-op RNG that always returns `min` for `next_u32_range` and `0.0` for
/// `next_f64`. Suitable for tests that do not depend on specific random values.
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}

/// An RNG that returns values from predetermined sequences.
///
/// Integer draws panic once their sequence is exhausted. Float draws cycle
/// through their sequence (or return `0.0` when it is empty), so tests only
/// need to script the draws they care about.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
    floats: Vec<f64>,
    float_index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given integer values.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self {
            values,
            index: 0,
            floats: Vec::new(),
            float_index: 0,
        }
    }

    /// Create a `SequenceRng` that scripts float draws only.
    #[must_use]
    pub fn with_floats(floats: Vec<f64>) -> Self {
        Self {
            values: Vec::new(),
            index: 0,
            floats,
            float_index: 0,
        }
    }

    /// Adds a float sequence to an integer-scripted RNG.
    #[must_use]
    pub fn and_floats(mut self, floats: Vec<f64>) -> Self {
        self.floats = floats;
        self
    }

    /// Number of float draws taken so far.
    #[must_use]
    pub fn float_draws(&self) -> usize {
        self.float_index
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
        let val = self.values[self.index];
        self.index += 1;
        val
    }

    fn next_f64(&mut self) -> f64 {
        if self.floats.is_empty() {
            return 0.0;
        }
        let val = self.floats[self.float_index % self.floats.len()];
        self.float_index += 1;
        val
    }
}
