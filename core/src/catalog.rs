//! Event catalog abstraction.
//!
//! The catalog owns `Event` rows. The registration ledger only reads from it
//! (existence and capacity); it never mutates events.
//!
//! # Implementations
//!
//! - `PostgresEventCatalog` (in `eventreg-postgres`): Production implementation
//! - `InMemoryDatabase` (in `eventreg-testing`): Fast, deterministic testing

use crate::error::Result;
use crate::types::{Event, EventId, NewEvent, PageRequest, UserId};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed, `Send` future returned by the store traits.
///
/// The traits use explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` so they stay dyn compatible (`Arc<dyn EventCatalog>`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read/create access to events.
pub trait EventCatalog: Send + Sync {
    /// Create an event owned by `creator`.
    ///
    /// Implementations call [`NewEvent::validate`] before writing.
    ///
    /// # Errors
    ///
    /// - `InvalidEvent`: Input failed validation
    /// - `Persistence`: Database connection or query failed
    fn create_event(
        &self,
        event: NewEvent,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Event>>;

    /// Load one event.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: No event with this id
    /// - `Persistence`: Database connection or query failed
    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Event>>;

    /// List events, most distant start time first.
    ///
    /// # Errors
    ///
    /// - `Persistence`: Database connection or query failed
    fn list_events(&self, page: PageRequest) -> BoxFuture<'_, Result<Vec<Event>>>;
}
