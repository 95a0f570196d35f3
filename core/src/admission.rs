//! Admission rules for the registration lifecycle.
//!
//! These functions are pure: given what a store read *inside its critical
//! section* (the pair's current status, the confirmed count, the capacity),
//! they decide which single write to perform, or which error to return.
//! Store implementations call them between "lock" and "write" so the check
//! and the action form one atomic unit.
//!
//! Rule order matters: a user who already holds a seat on a full event is
//! told `AlreadyRegistered`, not `CapacityExceeded`.

use crate::error::{LedgerError, Result};
use crate::types::{Capacity, EventId, RegistrationStatus, UserId};
use serde::{Deserialize, Serialize};

/// Whether new registrations hold a seat immediately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationPolicy {
    /// Registrations are created `confirmed`
    #[default]
    Automatic,
    /// Registrations are created `pending` and confirmed separately
    Manual,
}

impl ConfirmationPolicy {
    /// Status given to a new or reactivated registration.
    #[must_use]
    pub const fn initial_status(self) -> RegistrationStatus {
        match self {
            Self::Automatic => RegistrationStatus::Confirmed,
            Self::Manual => RegistrationStatus::Pending,
        }
    }

    /// Parse a policy name (`automatic` or `manual`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automatic" | "auto" => Some(Self::Automatic),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// The write a successful registration performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// No row exists for the pair: insert one with this status.
    Insert(RegistrationStatus),
    /// A cancelled row exists: flip it back to this status.
    Reactivate(RegistrationStatus),
}

impl Admission {
    /// Status the row ends up in.
    #[must_use]
    pub const fn status(self) -> RegistrationStatus {
        match self {
            Self::Insert(status) | Self::Reactivate(status) => status,
        }
    }
}

/// Decide a registration request.
///
/// # Errors
///
/// - [`LedgerError::AlreadyRegistered`] if `existing` is active
/// - [`LedgerError::CapacityExceeded`] if `confirmed` already fills `capacity`
pub fn admit(
    event_id: EventId,
    user_id: UserId,
    existing: Option<RegistrationStatus>,
    confirmed: u32,
    capacity: Capacity,
    policy: ConfirmationPolicy,
) -> Result<Admission> {
    if existing.is_some_and(|status| status.is_active()) {
        return Err(LedgerError::AlreadyRegistered { event_id, user_id });
    }

    if capacity.is_full(confirmed) {
        return Err(LedgerError::CapacityExceeded { event_id, capacity });
    }

    let status = policy.initial_status();
    Ok(match existing {
        None => Admission::Insert(status),
        Some(_) => Admission::Reactivate(status),
    })
}

/// Decide a cancellation request.
///
/// # Errors
///
/// Returns [`LedgerError::RegistrationNotFound`] unless `existing` is active.
pub fn release(
    event_id: EventId,
    user_id: UserId,
    existing: Option<RegistrationStatus>,
) -> Result<()> {
    match existing {
        Some(status) if status.is_active() => Ok(()),
        _ => Err(LedgerError::RegistrationNotFound { event_id, user_id }),
    }
}

/// Decide a pending → confirmed transition.
///
/// # Errors
///
/// - [`LedgerError::RegistrationNotFound`] if there is no active registration
/// - [`LedgerError::RegistrationNotPending`] if it is already confirmed
/// - [`LedgerError::CapacityExceeded`] if no seat is left
pub fn confirm(
    event_id: EventId,
    user_id: UserId,
    existing: Option<RegistrationStatus>,
    confirmed: u32,
    capacity: Capacity,
) -> Result<()> {
    match existing {
        None | Some(RegistrationStatus::Cancelled) => {
            Err(LedgerError::RegistrationNotFound { event_id, user_id })
        }
        Some(RegistrationStatus::Confirmed) => {
            Err(LedgerError::RegistrationNotPending { event_id, user_id })
        }
        Some(RegistrationStatus::Pending) if capacity.is_full(confirmed) => {
            Err(LedgerError::CapacityExceeded { event_id, capacity })
        }
        Some(RegistrationStatus::Pending) => Ok(()),
    }
}
