//! Error taxonomy for the registration ledger.
//!
//! Every failure is returned to the caller as a typed [`LedgerError`]; nothing
//! is logged-and-swallowed. Errors fall into four kinds (see [`ErrorKind`]):
//!
//! - **`NotFound`**: the event or the registration does not exist
//! - **`Conflict`**: a business rule refused the transition (duplicate
//!   registration, no seats left). Deterministic, retrying does not help.
//! - **`Validation`**: malformed input
//! - **`Persistence`**: the store failed or the deadline passed. The only
//!   kind where a caller-level retry is sane.

use crate::types::{Capacity, EventId, UserId};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by the event catalog and registration ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The event does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The user already holds an active registration for the event.
    #[error("User {user_id} is already registered for event {event_id}")]
    AlreadyRegistered {
        /// Event registered for
        event_id: EventId,
        /// User holding the active registration
        user_id: UserId,
    },

    /// Confirmed registrations already fill the event.
    #[error("Event {event_id} is at full capacity ({capacity} seats)")]
    CapacityExceeded {
        /// Full event
        event_id: EventId,
        /// Its capacity
        capacity: Capacity,
    },

    /// No active registration exists for the pair.
    #[error("No active registration for user {user_id} on event {event_id}")]
    RegistrationNotFound {
        /// Event looked up
        event_id: EventId,
        /// User looked up
        user_id: UserId,
    },

    /// Confirmation was requested for a registration that is not pending.
    #[error("Registration of user {user_id} for event {event_id} is not pending")]
    RegistrationNotPending {
        /// Event looked up
        event_id: EventId,
        /// User looked up
        user_id: UserId,
    },

    /// Event input failed validation.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// The operation did not finish before its deadline; its transaction was
    /// rolled back.
    #[error("Operation exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// Transaction or connectivity failure in the store.
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

/// Coarse classification of a [`LedgerError`], used by transport layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Event or registration absent
    NotFound,
    /// Business-rule violation
    Conflict,
    /// Malformed input
    Validation,
    /// Store failure or deadline; retryable by the caller
    Persistence,
}

impl LedgerError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EventNotFound(_) | Self::RegistrationNotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyRegistered { .. }
            | Self::CapacityExceeded { .. }
            | Self::RegistrationNotPending { .. } => ErrorKind::Conflict,
            Self::InvalidEvent(_) => ErrorKind::Validation,
            Self::DeadlineExceeded(_) | Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Whether retrying the same call could produce a different outcome.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Persistence)
    }

    /// Stable label used for metrics and error codes.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EventNotFound(_) => "event_not_found",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::RegistrationNotFound { .. } => "registration_not_found",
            Self::RegistrationNotPending { .. } => "registration_not_pending",
            Self::InvalidEvent(_) => "invalid_event",
            Self::DeadlineExceeded(_) => "deadline_exceeded",
            Self::Persistence(_) => "persistence_failure",
        }
    }
}
