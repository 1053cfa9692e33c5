//! Test clock: a pinned `Clock` for snapshot timestamps.

use chrono::{DateTime, TimeZone, Utc};
use questline_core::repository::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC on the given day.
    ///
    /// Falls back to the Unix epoch if the date does not exist.
    #[must_use]
    pub fn at_midnight(year: i32, month: u32, day: u32) -> Self {
        Self(
            Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
