//! # Eventreg Testing
//!
//! Testing utilities for the eventreg ledger.
//!
//! This crate provides:
//! - [`InMemoryDatabase`]: an [`EventCatalog`](eventreg_core::EventCatalog)
//!   and [`RegistrationStore`](eventreg_core::RegistrationStore) with
//!   per-event locking
//! - [`FixedClock`]: deterministic time
//! - [`fixtures`]: event inputs and ready-made ledgers
//!
//! ## Example
//!
//! ```ignore
//! use eventreg_testing::fixtures::{in_memory_ledger, new_event};
//!
//! #[tokio::test]
//! async fn test_sold_out() {
//!     let (db, ledger) = in_memory_ledger(ConfirmationPolicy::Automatic);
//!     let event = db.create_event(new_event("Launch", 1), UserId::new(1), now).await?;
//!
//!     ledger.register(event.id, UserId::new(2)).await?;
//!     assert!(ledger.register(event.id, UserId::new(3)).await.is_err());
//! }
//! ```

pub mod memory;

/// Mock implementations of environment traits.
pub mod mocks {
    use chrono::{DateTime, Utc};
    use eventreg_core::environment::Clock;
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until [`FixedClock::advance`] is called.
    ///
    /// # Example
    ///
    /// ```
    /// use eventreg_testing::mocks::FixedClock;
    /// use eventreg_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward. Every clone observes the change.
        pub fn advance(&self, by: chrono::Duration) {
            if let Ok(mut time) = self.time.write() {
                *time += by;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.read().map_or_else(|poisoned| **poisoned.get_ref(), |time| *time)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test fixtures.
pub mod fixtures {
    use crate::memory::InMemoryDatabase;
    use crate::mocks::test_clock;
    use chrono::{Duration, TimeZone, Utc};
    use eventreg_core::{
        Capacity, ConfirmationPolicy, LedgerConfig, NewEvent, RegistrationLedger,
    };
    use std::sync::Arc;

    /// Event input starting 2025-06-01 18:00 UTC in "Main Hall".
    ///
    /// # Panics
    ///
    /// Panics if `seats` is zero.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_event(title: &str, seats: u32) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: format!("{title} description"),
            location: "Main Hall".to_string(),
            starts_at: Utc
                .with_ymd_and_hms(2025, 6, 1, 18, 0, 0)
                .single()
                .expect("valid fixture date"),
            capacity: Capacity::new(seats).expect("fixture capacity must be at least 1"),
        }
    }

    /// Same as [`new_event`], starting `days` after the default date.
    #[must_use]
    pub fn new_event_in(title: &str, seats: u32, days: i64) -> NewEvent {
        let mut event = new_event(title, seats);
        event.starts_at += Duration::days(days);
        event
    }

    /// Ledger over a fresh [`InMemoryDatabase`] and the test clock.
    ///
    /// The database is returned too so tests can create events and inspect
    /// raw rows.
    #[must_use]
    pub fn in_memory_ledger(confirmation: ConfirmationPolicy) -> (InMemoryDatabase, RegistrationLedger) {
        let db = InMemoryDatabase::new();
        let ledger = RegistrationLedger::new(
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(test_clock()),
            LedgerConfig {
                confirmation,
                ..LedgerConfig::default()
            },
        );
        (db, ledger)
    }
}

// Re-export commonly used items
pub use memory::InMemoryDatabase;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use eventreg_core::Clock;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_fixed_clock_advance_is_shared() {
        let clock = test_clock();
        let other = clock.clone();
        let before = clock.now();

        other.advance(chrono::Duration::minutes(5));

        assert_eq!(clock.now() - before, chrono::Duration::minutes(5));
    }
}
