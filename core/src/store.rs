//! Registration store abstraction.
//!
//! A `RegistrationStore` is the persistence collaborator of the ledger. Each
//! mutating method is one atomic unit: the implementation begins its
//! transaction (or takes its lock) *before* reading the confirmed count and
//! the pair's current row, decides with the rules in [`crate::admission`],
//! writes, and only then commits. Nothing in between is observable by
//! another caller, so check-then-act races cannot overbook an event.
//!
//! Concurrency control is scoped per event: operations on different events
//! never wait on each other.
//!
//! # Implementations
//!
//! - `PostgresRegistrationStore` (in `eventreg-postgres`): row locks on the event
//! - `InMemoryDatabase` (in `eventreg-testing`): one mutex per event

use crate::admission::ConfirmationPolicy;
use crate::catalog::BoxFuture;
use crate::error::Result;
use crate::types::{Availability, EventId, Registrant, Registration, UserId, UserRegistration};
use chrono::{DateTime, Utc};

/// Transactional storage for registrations.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the ledger shares one instance
/// across every request task.
pub trait RegistrationStore: Send + Sync {
    /// Atomically admit `user_id` to `event_id`.
    ///
    /// Inserts a row, or reactivates the pair's cancelled row, with the
    /// policy's initial status. Exactly one row is written on success and
    /// none on failure.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: No event with this id
    /// - `AlreadyRegistered`: The pair already has an active registration
    /// - `CapacityExceeded`: Confirmed registrations fill the event
    /// - `Persistence`: Transaction failed; nothing was written
    fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
        policy: ConfirmationPolicy,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>>;

    /// Atomically move the pair's active registration to `cancelled`.
    ///
    /// Returns the registration as it is after cancellation.
    ///
    /// # Errors
    ///
    /// - `RegistrationNotFound`: No active registration for the pair
    /// - `Persistence`: Transaction failed; nothing was written
    fn cancel(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>>;

    /// Atomically move the pair's pending registration to `confirmed`.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: No event with this id
    /// - `RegistrationNotFound`: No active registration for the pair
    /// - `RegistrationNotPending`: The registration is already confirmed
    /// - `CapacityExceeded`: Confirmed registrations fill the event
    /// - `Persistence`: Transaction failed; nothing was written
    fn confirm(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>>;

    /// Number of confirmed registrations for the event.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: No event with this id
    /// - `Persistence`: Query failed
    fn confirmed_count(&self, event_id: EventId) -> BoxFuture<'_, Result<u32>>;

    /// Capacity and confirmed count, read together.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: No event with this id
    /// - `Persistence`: Query failed
    fn availability(&self, event_id: EventId) -> BoxFuture<'_, Result<Availability>>;

    /// Active registrations for the event, newest first.
    ///
    /// Does not check that the event exists; an unknown event has no
    /// registrants.
    ///
    /// # Errors
    ///
    /// - `Persistence`: Query failed
    fn list_registrants(&self, event_id: EventId) -> BoxFuture<'_, Result<Vec<Registrant>>>;

    /// The user's active registrations with event details, latest event first.
    ///
    /// # Errors
    ///
    /// - `Persistence`: Query failed
    fn registrations_for_user(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<UserRegistration>>>;
}
