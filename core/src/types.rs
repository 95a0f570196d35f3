//! Domain types for event registration.
//!
//! Identifiers are integer newtypes so that an `EventId` can never be passed
//! where a `UserId` is expected. `Capacity` carries the `capacity >= 1`
//! invariant in its type: once constructed it is always valid.

use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Create an `EventId` from its database value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an authenticated principal.
///
/// How the principal was authenticated is not the ledger's concern; it only
/// ever sees this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a `UserId` from its raw value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registration row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(i64);

impl RegistrationId {
    /// Create a `RegistrationId` from its database value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Maximum number of confirmed registrations an event accepts.
///
/// Always at least 1.
///
/// # Example
///
/// ```
/// use eventreg_core::types::Capacity;
///
/// assert!(Capacity::new(0).is_err());
/// assert_eq!(Capacity::new(50).map(Capacity::get).ok(), Some(50));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Capacity(u32);

impl Capacity {
    /// Create a capacity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidEvent`] if `seats` is zero.
    pub fn new(seats: u32) -> Result<Self> {
        if seats == 0 {
            return Err(LedgerError::InvalidEvent(
                "capacity must be greater than 0".to_string(),
            ));
        }
        Ok(Self(seats))
    }

    /// Number of seats.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether `confirmed` registrations already fill every seat.
    #[must_use]
    pub const fn is_full(self, confirmed: u32) -> bool {
        confirmed >= self.0
    }
}

impl TryFrom<u32> for Capacity {
    type Error = LedgerError;

    fn try_from(seats: u32) -> Result<Self> {
        Self::new(seats)
    }
}

impl TryFrom<i32> for Capacity {
    type Error = LedgerError;

    fn try_from(seats: i32) -> Result<Self> {
        let seats = u32::try_from(seats).map_err(|_| {
            LedgerError::InvalidEvent(format!("capacity must be positive, got {seats}"))
        })?;
        Self::new(seats)
    }
}

impl From<Capacity> for u32 {
    fn from(capacity: Capacity) -> Self {
        capacity.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Events
// ============================================================================

/// An event in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Where the event takes place
    pub location: String,
    /// Scheduled start time
    pub starts_at: DateTime<Utc>,
    /// Maximum confirmed registrations
    pub capacity: Capacity,
    /// User who created the event
    pub creator_id: UserId,
    /// When the event was created
    pub created_at: DateTime<Utc>,
    /// When the event was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event title (required, non-blank)
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Location (required, non-blank)
    pub location: String,
    /// Scheduled start time
    pub starts_at: DateTime<Utc>,
    /// Maximum confirmed registrations
    pub capacity: Capacity,
}

impl NewEvent {
    /// Maximum accepted title length, in characters.
    pub const MAX_TITLE_LEN: usize = 200;

    /// Check the text fields.
    ///
    /// Capacity needs no check here: a [`Capacity`] is valid by construction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidEvent`] if the title or location is blank,
    /// or the title is longer than [`Self::MAX_TITLE_LEN`].
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LedgerError::InvalidEvent("title is required".to_string()));
        }
        if self.title.chars().count() > Self::MAX_TITLE_LEN {
            return Err(LedgerError::InvalidEvent(format!(
                "title must be at most {} characters",
                Self::MAX_TITLE_LEN
            )));
        }
        if self.location.trim().is_empty() {
            return Err(LedgerError::InvalidEvent("location is required".to_string()));
        }
        Ok(())
    }
}

/// Page selection for event listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (0-indexed)
    pub page: u32,
    /// Page size, clamped to [`PageRequest::MAX_PAGE_SIZE`]
    pub page_size: u32,
}

impl PageRequest {
    /// Default page size.
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    /// Largest page a caller may request.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Create a page request, clamping the size to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.page_size as u64
    }

    /// Number of rows to return.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_PAGE_SIZE)
    }
}

// ============================================================================
// Registrations
// ============================================================================

/// Lifecycle status of a registration.
///
/// ```text
/// pending ──confirm──▶ confirmed
///    │                     │
///    └──────cancel─────────┴──▶ cancelled ──register──▶ pending | confirmed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Registered, waiting for confirmation; does not consume capacity
    Pending,
    /// Holds one seat
    Confirmed,
    /// Released; the row may be reactivated by a new registration
    Cancelled,
}

impl RegistrationStatus {
    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse status from database string.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(LedgerError::Persistence(format!(
                "Invalid registration status: {s}"
            ))),
        }
    }

    /// Active registrations are every status except `cancelled`.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's registration for an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Registration identifier (stable across cancel/reactivate)
    pub id: RegistrationId,
    /// Event registered for
    pub event_id: EventId,
    /// Registered user
    pub user_id: UserId,
    /// Current lifecycle status
    pub status: RegistrationStatus,
    /// When the current registration was made (reset on reactivation)
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

/// One entry of an event's registrant list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    /// Registered user
    pub user_id: UserId,
    /// `pending` or `confirmed`
    pub status: RegistrationStatus,
    /// When the registration was made
    pub registered_at: DateTime<Utc>,
}

/// One of a user's active registrations, joined with event details.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistration {
    /// Registration identifier
    pub registration_id: RegistrationId,
    /// Event registered for
    pub event_id: EventId,
    /// Event title
    pub event_title: String,
    /// Event start time
    pub event_starts_at: DateTime<Utc>,
    /// Event location
    pub location: String,
    /// `pending` or `confirmed`
    pub status: RegistrationStatus,
    /// When the registration was made
    pub registered_at: DateTime<Utc>,
}

/// Seat availability for an event, read in one consistent snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Event identifier
    pub event_id: EventId,
    /// Total seats
    pub capacity: Capacity,
    /// Confirmed registrations
    pub confirmed: u32,
}

impl Availability {
    /// Seats still open.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.capacity.get().saturating_sub(self.confirmed)
    }
}
