//! # Expense Tracker Testing
//!
//! Helpers shared by the expense tracker test suites:
//! - [`FixedClock`] so "last N days" filters are deterministic
//! - [`ReducerTest`] for Given-When-Then reducer tests
//! - [`init_tracing`] to see reducer logs while debugging a test

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use expense_tracker_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, NaiveDate, NaiveTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// ```
    /// use expense_tracker_testing::mocks::FixedClock;
    /// use expense_tracker_core::environment::Clock;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap_or_default();
    /// let clock = FixedClock::on(day);
    /// assert_eq!(clock.today(), day);
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a clock frozen at `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Create a clock frozen at noon UTC on `date`
        #[must_use]
        pub fn on(date: NaiveDate) -> Self {
            Self::new(date.and_time(NaiveTime::MIN).and_utc() + chrono::Duration::hours(12))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Default clock for tests: 2024-03-10 12:00:00 UTC
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2024-03-10T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

pub use mocks::{FixedClock, test_clock};

/// Install a test-friendly tracing subscriber once per process
///
/// Honors `RUST_LOG`; output is captured by the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.today().to_string(), "2024-03-10");
    }

    #[test]
    fn fixed_clock_on_date_reports_that_date() {
        let day = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default();
        assert_eq!(FixedClock::on(day).today(), day);
    }
}
