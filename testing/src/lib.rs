//! # Firmenlauf Testing
//!
//! Testing utilities for reducers and the Store runtime.
//!
//! This crate provides:
//! - A fixed [`Clock`] for deterministic registration windows
//! - The [`ReducerTest`] Given-When-Then builder
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use firmenlauf_testing::clock_on;
//!
//! let clock = clock_on(2025, 5, 1);
//! assert_eq!(clock.today().to_string(), "2025-05-01");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, NaiveDate, Utc};
use firmenlauf_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, NaiveDate, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use firmenlauf_testing::mocks::FixedClock;
    /// use firmenlauf_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Fixed clock at noon UTC of the given date
        #[must_use]
        pub fn at_date(date: NaiveDate) -> Self {
            Self::new(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }

    /// Fixed clock on the given calendar day
    ///
    /// # Panics
    ///
    /// Panics if the date components are out of range.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper with literal dates
    pub fn clock_on(year: i32, month: u32, day: u32) -> FixedClock {
        FixedClock::at_date(
            NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date"),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, clock_on, test_clock};
