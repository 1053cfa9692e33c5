//! Shared test helpers for sim integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use questline_sim::config::SimConfig;
use questline_test_support::FixedClock;

/// Fixed timestamp used across all integration tests.
pub fn fixed_clock() -> FixedClock {
    FixedClock::at_midnight(2026, 1, 15)
}

/// A config running `ticks` ticks with seed 7 and an optional save file.
pub fn config(ticks: i64, save_path: Option<PathBuf>) -> SimConfig {
    SimConfig {
        ticks,
        seed: 7,
        save_path,
        ..SimConfig::default()
    }
}
