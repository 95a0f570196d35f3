//! # Eventreg Core
//!
//! Domain types, admission rules and the registration ledger for the eventreg
//! event-management backend.
//!
//! ## Core Concepts
//!
//! - **Event Catalog**: owns events (title, schedule, capacity)
//! - **Registration Ledger**: owns registrations and enforces the invariants
//! - **Registration Store**: the transactional persistence collaborator
//!
//! ## Invariants
//!
//! - At most one active (non-cancelled) registration per `(event, user)` pair
//! - Confirmed registrations for an event never exceed its capacity
//!
//! Both are enforced by the store inside a single transaction per operation,
//! using the pure rules in [`admission`]. The check ("is there a seat?") and
//! the action ("take it") are never two separate round-trips.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │   Request layer (axum)   │  ← authenticated principal + event id
//! └────────────┬─────────────┘
//!              ▼
//! ┌──────────────────────────┐
//! │    RegistrationLedger    │  ← clock, policy, deadline, logs, metrics
//! └──────┬────────────┬──────┘
//!        ▼            ▼
//! ┌────────────┐ ┌───────────────────┐
//! │EventCatalog│ │ RegistrationStore │  ← lock, read, admission::admit, write, commit
//! └────────────┘ └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use eventreg_core::*;
//!
//! let ledger = RegistrationLedger::new(catalog, store, Arc::new(SystemClock), LedgerConfig::default());
//!
//! match ledger.register(event_id, user_id).await {
//!     Ok(registration) => println!("seat taken: {}", registration.id),
//!     Err(LedgerError::CapacityExceeded { .. }) => println!("sold out"),
//!     Err(other) => return Err(other),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use admission::ConfirmationPolicy;
pub use catalog::{BoxFuture, EventCatalog};
pub use chrono::{DateTime, Utc};
pub use error::{ErrorKind, LedgerError, Result};
pub use ledger::{LedgerConfig, RegistrationLedger};
pub use store::RegistrationStore;
pub use types::{
    Availability, Capacity, Event, EventId, NewEvent, PageRequest, Registrant, Registration,
    RegistrationId, RegistrationStatus, UserId, UserRegistration,
};

/// Environment module - injected dependencies
///
/// External time is abstracted behind a trait so tests can pin it.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Production - uses system clock
    /// let clock = SystemClock;
    ///
    /// // Test - fixed time for deterministic tests
    /// let clock = FixedClock::new(time);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

pub use environment::{Clock, SystemClock};
