//! A clock capability so that date validation can be tested deterministically
//! instead of reading the ambient system time.

use time::{Date, OffsetDateTime};

/// Provides the current calendar date to code that must compare inputs
/// against "today", e.g. the future-date check on income records.
pub trait Clock {
    /// The current calendar date.
    fn today(&self) -> Date;
}

/// A [Clock] that reads the system time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// A [Clock] that always reports the same date.
///
/// Intended for tests that need "today" pinned to a known value.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

#[cfg(test)]
mod clock_tests {
    use time::macros::date;

    use super::{Clock, FixedClock};

    #[test]
    fn fixed_clock_reports_the_pinned_date() {
        let clock = FixedClock(date!(2024 - 06 - 01));

        assert_eq!(clock.today(), date!(2024 - 06 - 01));
    }
}
