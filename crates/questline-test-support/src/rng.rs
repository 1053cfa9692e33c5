//! Test RNGs: scripted `DeterministicRng` implementations.

use std::collections::VecDeque;

use questline_core::rng::DeterministicRng;

/// Always returns `min` for `next_u32_range` and `0.0` for `next_f64`.
///
/// Under [`questline_core::rng::shuffle`] this leaves a slice rotated by one
/// position, which is deterministic enough for ordering assertions.
#[derive(Debug, Default)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}

/// Replays a scripted sequence, clamped into the requested range. Once the
/// sequence is exhausted it behaves like [`MockRng`].
#[derive(Debug, Default)]
pub struct SequenceRng {
    values: VecDeque<u32>,
    floats: VecDeque<f64>,
}

impl SequenceRng {
    /// Integer draws come from `values`, in order.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self {
            values: values.into(),
            floats: VecDeque::new(),
        }
    }

    /// Float draws come from `floats`, in order.
    #[must_use]
    pub fn with_floats(mut self, floats: Vec<f64>) -> Self {
        self.floats = floats.into();
        self
    }

    /// Integer draws not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.values
            .pop_front()
            .map_or(min, |value| value.clamp(min, max.max(min)))
    }

    fn next_f64(&mut self) -> f64 {
        self.floats.pop_front().unwrap_or(0.0)
    }
}
