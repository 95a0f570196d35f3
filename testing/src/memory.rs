//! In-memory event catalog and registration store.
//!
//! [`InMemoryDatabase`] implements both [`EventCatalog`] and
//! [`RegistrationStore`] with the same guarantees as the `PostgreSQL`
//! implementation:
//!
//! - each event owns its own mutex, taken for the whole of every mutating
//!   operation (read count, decide, write), so operations on one event are
//!   serialized and operations on different events run in parallel
//! - the registration map is keyed by user, so a pair can never have two rows
//!
//! Cloning is cheap and every clone shares the same data.

use chrono::{DateTime, Utc};
use eventreg_core::admission::{self, Admission, ConfirmationPolicy};
use eventreg_core::catalog::{BoxFuture, EventCatalog};
use eventreg_core::error::{LedgerError, Result};
use eventreg_core::store::RegistrationStore;
use eventreg_core::types::{
    Availability, Event, EventId, NewEvent, PageRequest, Registrant, Registration,
    RegistrationId, RegistrationStatus, UserId, UserRegistration,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::{Mutex, RwLock};

/// One event and the registrations guarded by its lock.
#[derive(Debug)]
struct EventSlot {
    event: Event,
    registrations: Mutex<HashMap<UserId, Registration>>,
}

impl EventSlot {
    fn confirmed(registrations: &HashMap<UserId, Registration>) -> u32 {
        let count = registrations
            .values()
            .filter(|r| r.status == RegistrationStatus::Confirmed)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Default)]
struct Inner {
    events: RwLock<HashMap<EventId, Arc<EventSlot>>>,
    next_event_id: AtomicI64,
    next_registration_id: AtomicI64,
    unavailable: AtomicBool,
}

/// Thread-safe in-memory database for tests and local runs.
///
/// # Example
///
/// ```
/// use eventreg_testing::InMemoryDatabase;
/// use eventreg_testing::fixtures::new_event;
/// use eventreg_core::{ConfirmationPolicy, EventCatalog, RegistrationStore, UserId};
/// use chrono::Utc;
///
/// # async fn example() -> eventreg_core::Result<()> {
/// let db = InMemoryDatabase::new();
/// let event = db.create_event(new_event("Launch", 1), UserId::new(1), Utc::now()).await?;
///
/// db.register(event.id, UserId::new(2), ConfirmationPolicy::Automatic, Utc::now()).await?;
/// assert_eq!(db.confirmed_count(event.id).await?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryDatabase {
    inner: Arc<Inner>,
}

impl InMemoryDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while set, every call fails with
    /// [`LedgerError::Persistence`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored events.
    pub async fn event_count(&self) -> usize {
        self.inner.events.read().await.len()
    }

    /// Raw row for the pair, including cancelled rows.
    pub async fn registration(&self, event_id: EventId, user_id: UserId) -> Option<Registration> {
        let slot = self.inner.events.read().await.get(&event_id).cloned()?;
        let registrations = slot.registrations.lock().await;
        registrations.get(&user_id).cloned()
    }

    fn available(&self) -> Result<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Persistence("in-memory store is unavailable".into()));
        }
        Ok(())
    }

    async fn slot(&self, event_id: EventId) -> Result<Arc<EventSlot>> {
        self.available()?;
        self.inner
            .events
            .read()
            .await
            .get(&event_id)
            .cloned()
            .ok_or(LedgerError::EventNotFound(event_id))
    }

    fn next_registration_id(&self) -> RegistrationId {
        RegistrationId::new(self.inner.next_registration_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn insert_event(
        &self,
        event: NewEvent,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> Result<Event> {
        self.available()?;
        event.validate()?;

        let id = EventId::new(self.inner.next_event_id.fetch_add(1, Ordering::SeqCst) + 1);
        let created = Event {
            id,
            title: event.title,
            description: event.description,
            location: event.location,
            starts_at: event.starts_at,
            capacity: event.capacity,
            creator_id: creator,
            created_at: now,
            updated_at: now,
        };

        self.inner.events.write().await.insert(
            id,
            Arc::new(EventSlot {
                event: created.clone(),
                registrations: Mutex::new(HashMap::new()),
            }),
        );
        Ok(created)
    }

    async fn fetch_event(&self, event_id: EventId) -> Result<Event> {
        Ok(self.slot(event_id).await?.event.clone())
    }

    async fn page(&self, page: PageRequest) -> Result<Vec<Event>> {
        self.available()?;
        let mut events: Vec<Event> = self
            .inner
            .events
            .read()
            .await
            .values()
            .map(|slot| slot.event.clone())
            .collect();
        events.sort_by(|a, b| {
            b.starts_at
                .cmp(&a.starts_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(events.into_iter().skip(offset).take(limit).collect())
    }

    async fn admit(
        &self,
        event_id: EventId,
        user_id: UserId,
        policy: ConfirmationPolicy,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        let slot = self.slot(event_id).await?;
        let mut registrations = slot.registrations.lock().await;

        let existing = registrations.get(&user_id).map(|r| r.status);
        let confirmed = EventSlot::confirmed(&registrations);

        let registration = match admission::admit(
            event_id,
            user_id,
            existing,
            confirmed,
            slot.event.capacity,
            policy,
        )? {
            Admission::Insert(status) => Registration {
                id: self.next_registration_id(),
                event_id,
                user_id,
                status,
                created_at: now,
                updated_at: now,
            },
            Admission::Reactivate(status) => {
                let previous = registrations
                    .get(&user_id)
                    .ok_or(LedgerError::RegistrationNotFound { event_id, user_id })?;
                Registration {
                    status,
                    created_at: now,
                    updated_at: now,
                    ..previous.clone()
                }
            }
        };

        registrations.insert(user_id, registration.clone());
        Ok(registration)
    }

    async fn release(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        let slot = match self.slot(event_id).await {
            Ok(slot) => slot,
            Err(LedgerError::EventNotFound(_)) => {
                return Err(LedgerError::RegistrationNotFound { event_id, user_id });
            }
            Err(e) => return Err(e),
        };
        let mut registrations = slot.registrations.lock().await;

        admission::release(event_id, user_id, registrations.get(&user_id).map(|r| r.status))?;

        let row = registrations
            .get_mut(&user_id)
            .ok_or(LedgerError::RegistrationNotFound { event_id, user_id })?;
        row.status = RegistrationStatus::Cancelled;
        row.updated_at = now;
        Ok(row.clone())
    }

    async fn approve(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        let slot = self.slot(event_id).await?;
        let mut registrations = slot.registrations.lock().await;

        let existing = registrations.get(&user_id).map(|r| r.status);
        let confirmed = EventSlot::confirmed(&registrations);
        admission::confirm(event_id, user_id, existing, confirmed, slot.event.capacity)?;

        let row = registrations
            .get_mut(&user_id)
            .ok_or(LedgerError::RegistrationNotFound { event_id, user_id })?;
        row.status = RegistrationStatus::Confirmed;
        row.updated_at = now;
        Ok(row.clone())
    }

    async fn read_availability(&self, event_id: EventId) -> Result<Availability> {
        let slot = self.slot(event_id).await?;
        let registrations = slot.registrations.lock().await;
        Ok(Availability {
            event_id,
            capacity: slot.event.capacity,
            confirmed: EventSlot::confirmed(&registrations),
        })
    }

    async fn active_registrants(&self, event_id: EventId) -> Result<Vec<Registrant>> {
        let slot = match self.slot(event_id).await {
            Ok(slot) => slot,
            Err(LedgerError::EventNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let registrations = slot.registrations.lock().await;

        let mut active: Vec<&Registration> = registrations
            .values()
            .filter(|r| r.status.is_active())
            .collect();
        active.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });

        Ok(active
            .into_iter()
            .map(|r| Registrant {
                user_id: r.user_id,
                status: r.status,
                registered_at: r.created_at,
            })
            .collect())
    }

    async fn active_for_user(&self, user_id: UserId) -> Result<Vec<UserRegistration>> {
        self.available()?;
        let slots: Vec<Arc<EventSlot>> = self.inner.events.read().await.values().cloned().collect();

        let mut found = Vec::new();
        for slot in slots {
            let registrations = slot.registrations.lock().await;
            if let Some(r) = registrations.get(&user_id).filter(|r| r.status.is_active()) {
                found.push(UserRegistration {
                    registration_id: r.id,
                    event_id: slot.event.id,
                    event_title: slot.event.title.clone(),
                    event_starts_at: slot.event.starts_at,
                    location: slot.event.location.clone(),
                    status: r.status,
                    registered_at: r.created_at,
                });
            }
        }

        found.sort_by(|a, b| {
            b.event_starts_at
                .cmp(&a.event_starts_at)
                .then_with(|| b.registration_id.value().cmp(&a.registration_id.value()))
        });
        Ok(found)
    }
}

impl EventCatalog for InMemoryDatabase {
    fn create_event(
        &self,
        event: NewEvent,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Event>> {
        Box::pin(self.insert_event(event, creator, now))
    }

    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Event>> {
        Box::pin(self.fetch_event(event_id))
    }

    fn list_events(&self, page: PageRequest) -> BoxFuture<'_, Result<Vec<Event>>> {
        Box::pin(self.page(page))
    }
}

impl RegistrationStore for InMemoryDatabase {
    fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
        policy: ConfirmationPolicy,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(self.admit(event_id, user_id, policy, now))
    }

    fn cancel(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(self.release(event_id, user_id, now))
    }

    fn confirm(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(self.approve(event_id, user_id, now))
    }

    fn confirmed_count(&self, event_id: EventId) -> BoxFuture<'_, Result<u32>> {
        Box::pin(async move { Ok(self.read_availability(event_id).await?.confirmed) })
    }

    fn availability(&self, event_id: EventId) -> BoxFuture<'_, Result<Availability>> {
        Box::pin(self.read_availability(event_id))
    }

    fn list_registrants(&self, event_id: EventId) -> BoxFuture<'_, Result<Vec<Registrant>>> {
        Box::pin(self.active_registrants(event_id))
    }

    fn registrations_for_user(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<UserRegistration>>> {
        Box::pin(self.active_for_user(user_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::new_event;
    use crate::mocks::test_clock;
    use eventreg_core::Clock;

    #[tokio::test]
    async fn reactivation_keeps_row_id() {
        let db = InMemoryDatabase::new();
        let now = test_clock().now();
        let event = db.create_event(new_event("Talk", 2), UserId::new(1), now).await.unwrap();
        let user = UserId::new(9);

        let first = db.register(event.id, user, ConfirmationPolicy::Automatic, now).await.unwrap();
        db.cancel(event.id, user, now).await.unwrap();
        assert_eq!(
            db.registration(event.id, user).await.unwrap().status,
            RegistrationStatus::Cancelled
        );

        let again = db.register(event.id, user, ConfirmationPolicy::Automatic, now).await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.status, RegistrationStatus::Confirmed);
    }

    #[tokio::test]
    async fn unavailable_store_reports_persistence_failure() {
        let db = InMemoryDatabase::new();
        db.set_unavailable(true);
        let err = db.get_event(EventId::new(1)).await.unwrap_err();
        assert!(err.is_retryable());

        db.set_unavailable(false);
        assert_eq!(
            db.get_event(EventId::new(1)).await.unwrap_err(),
            LedgerError::EventNotFound(EventId::new(1))
        );
    }

    #[tokio::test]
    async fn invalid_event_is_rejected() {
        let db = InMemoryDatabase::new();
        let err = db
            .create_event(new_event("   ", 3), UserId::new(1), test_clock().now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidEvent(_)));
        assert_eq!(db.event_count().await, 0);
    }

    #[tokio::test]
    async fn list_events_pages_latest_first() {
        let db = InMemoryDatabase::new();
        let now = test_clock().now();
        for n in 0..3 {
            let mut event = new_event(&format!("Event {n}"), 1);
            event.starts_at += chrono::Duration::days(n);
            db.create_event(event, UserId::new(1), now).await.unwrap();
        }

        let first = db.list_events(PageRequest::new(0, 2)).await.unwrap();
        let titles: Vec<_> = first.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Event 2", "Event 1"]);

        let second = db.list_events(PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].title, "Event 0");
    }
}
