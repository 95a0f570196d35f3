//! `PostgreSQL` event catalog.

use chrono::{DateTime, Utc};
use eventreg_core::catalog::{BoxFuture, EventCatalog};
use eventreg_core::error::{LedgerError, Result};
use eventreg_core::types::{Capacity, Event, EventId, NewEvent, PageRequest, UserId};
use sqlx::PgPool;

/// Row shape of the `events` table.
#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    title: String,
    description: String,
    location: String,
    starts_at: DateTime<Utc>,
    capacity: i32,
    creator_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = LedgerError;

    fn try_from(row: EventRow) -> Result<Self> {
        let capacity = Capacity::try_from(row.capacity).map_err(|_| {
            LedgerError::Persistence(format!(
                "Invalid capacity {} stored for event {}",
                row.capacity, row.id
            ))
        })?;

        Ok(Self {
            id: EventId::new(row.id),
            title: row.title,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            capacity,
            creator_id: UserId::new(row.creator_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `PostgreSQL` event catalog.
#[derive(Clone)]
pub struct PostgresEventCatalog {
    pool: PgPool,
}

impl PostgresEventCatalog {
    /// Create a catalog over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert(&self, event: NewEvent, creator: UserId, now: DateTime<Utc>) -> Result<Event> {
        event.validate()?;

        let capacity = i32::try_from(event.capacity.get()).map_err(|_| {
            LedgerError::InvalidEvent(format!(
                "capacity {} exceeds the supported maximum",
                event.capacity
            ))
        })?;

        let row: EventRow = sqlx::query_as(
            r"
            INSERT INTO events
                (title, description, location, starts_at, capacity, creator_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, title, description, location, starts_at, capacity,
                      creator_id, created_at, updated_at
            ",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(capacity)
        .bind(creator.value())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("Failed to create event: {e}")))?;

        let created = Event::try_from(row)?;

        tracing::info!(
            event_id = %created.id,
            creator_id = %creator,
            capacity = %created.capacity,
            "Event created"
        );
        metrics::counter!("eventreg_events_created_total").increment(1);

        Ok(created)
    }

    async fn fetch(&self, event_id: EventId) -> Result<Event> {
        let row: EventRow = sqlx::query_as(
            r"
            SELECT id, title, description, location, starts_at, capacity,
                   creator_id, created_at, updated_at
            FROM events
            WHERE id = $1
            ",
        )
        .bind(event_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("Failed to get event: {e}")))?
        .ok_or(LedgerError::EventNotFound(event_id))?;

        Event::try_from(row)
    }

    async fn page(&self, page: PageRequest) -> Result<Vec<Event>> {
        #[allow(clippy::cast_possible_wrap)] // Page bounds are clamped far below i64::MAX
        let rows: Vec<EventRow> = sqlx::query_as(
            r"
            SELECT id, title, description, location, starts_at, capacity,
                   creator_id, created_at, updated_at
            FROM events
            ORDER BY starts_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("Failed to list events: {e}")))?;

        rows.into_iter().map(Event::try_from).collect()
    }
}

impl EventCatalog for PostgresEventCatalog {
    fn create_event(
        &self,
        event: NewEvent,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Event>> {
        Box::pin(self.insert(event, creator, now))
    }

    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Event>> {
        Box::pin(self.fetch(event_id))
    }

    fn list_events(&self, page: PageRequest) -> BoxFuture<'_, Result<Vec<Event>>> {
        Box::pin(self.page(page))
    }
}
