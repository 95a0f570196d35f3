//! `PostgreSQL` registration store.
//!
//! # Concurrency
//!
//! `register` and `confirm` run one transaction each:
//!
//! 1. `SELECT ... FROM events WHERE id = $1 FOR UPDATE` serializes every
//!    capacity-consuming write for that event (other events are unaffected)
//! 2. read the pair's row (also `FOR UPDATE`) and the confirmed count
//! 3. decide with [`eventreg_core::admission`]
//! 4. write exactly one row, then commit
//!
//! `cancel` can only free a seat, so it is a single conditional `UPDATE` and
//! takes no event lock. The `UNIQUE (event_id, user_id)` constraint is the
//! last line against duplicate rows; a violation is reported as
//! `AlreadyRegistered`.
//!
//! Dropping any of these futures mid-flight drops the open transaction, which
//! rolls it back.

use chrono::{DateTime, Utc};
use eventreg_core::admission::{self, Admission, ConfirmationPolicy};
use eventreg_core::catalog::BoxFuture;
use eventreg_core::error::{LedgerError, Result};
use eventreg_core::store::RegistrationStore;
use eventreg_core::types::{
    Availability, Capacity, EventId, Registrant, Registration, RegistrationId,
    RegistrationStatus, UserId, UserRegistration,
};
use sqlx::{PgPool, Postgres, Transaction};

/// Row shape of the `registrations` table.
#[derive(sqlx::FromRow)]
struct RegistrationRow {
    id: i64,
    event_id: i64,
    user_id: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = LedgerError;

    fn try_from(row: RegistrationRow) -> Result<Self> {
        Ok(Self {
            id: RegistrationId::new(row.id),
            event_id: EventId::new(row.event_id),
            user_id: UserId::new(row.user_id),
            status: RegistrationStatus::parse(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RegistrantRow {
    user_id: i64,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserRegistrationRow {
    id: i64,
    event_id: i64,
    title: String,
    starts_at: DateTime<Utc>,
    location: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AvailabilityRow {
    capacity: i32,
    confirmed: i64,
}

/// `PostgreSQL` registration store.
#[derive(Clone)]
pub struct PostgresRegistrationStore {
    pool: PgPool,
}

impl PostgresRegistrationStore {
    /// Create a store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| LedgerError::Persistence(format!("Failed to start transaction: {e}")))
    }

    async fn insert_or_reactivate(
        &self,
        event_id: EventId,
        user_id: UserId,
        policy: ConfirmationPolicy,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        let mut tx = self.begin().await?;

        let capacity = lock_event(&mut tx, event_id).await?;
        let existing = lock_pair(&mut tx, event_id, user_id).await?;
        let confirmed = count_confirmed(&mut tx, event_id).await?;

        let admission = match admission::admit(event_id, user_id, existing, confirmed, capacity, policy) {
            Ok(admission) => admission,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };

        let row: RegistrationRow = match admission {
            Admission::Insert(status) => sqlx::query_as(
                r"
                INSERT INTO registrations (event_id, user_id, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING id, event_id, user_id, status, created_at, updated_at
                ",
            )
            .bind(event_id.value())
            .bind(user_id.value())
            .bind(status.as_str())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return LedgerError::AlreadyRegistered { event_id, user_id };
                    }
                }
                LedgerError::Persistence(format!("Failed to insert registration: {e}"))
            })?,
            Admission::Reactivate(status) => sqlx::query_as(
                r"
                UPDATE registrations
                SET status = $3, created_at = $4, updated_at = $4
                WHERE event_id = $1 AND user_id = $2 AND status = 'cancelled'
                RETURNING id, event_id, user_id, status, created_at, updated_at
                ",
            )
            .bind(event_id.value())
            .bind(user_id.value())
            .bind(status.as_str())
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| LedgerError::Persistence(format!("Failed to reactivate registration: {e}")))?
            .ok_or(LedgerError::AlreadyRegistered { event_id, user_id })?,
        };

        tx.commit()
            .await
            .map_err(|e| LedgerError::Persistence(format!("Failed to commit registration: {e}")))?;

        Registration::try_from(row)
    }

    async fn mark_cancelled(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        let row: RegistrationRow = sqlx::query_as(
            r"
            UPDATE registrations
            SET status = 'cancelled', updated_at = $3
            WHERE event_id = $1 AND user_id = $2 AND status <> 'cancelled'
            RETURNING id, event_id, user_id, status, created_at, updated_at
            ",
        )
        .bind(event_id.value())
        .bind(user_id.value())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("Failed to cancel registration: {e}")))?
        .ok_or(LedgerError::RegistrationNotFound { event_id, user_id })?;

        Registration::try_from(row)
    }

    async fn mark_confirmed(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        let mut tx = self.begin().await?;

        let capacity = lock_event(&mut tx, event_id).await?;
        let existing = lock_pair(&mut tx, event_id, user_id).await?;
        let confirmed = count_confirmed(&mut tx, event_id).await?;

        if let Err(e) = admission::confirm(event_id, user_id, existing, confirmed, capacity) {
            let _ = tx.rollback().await;
            return Err(e);
        }

        let row: RegistrationRow = sqlx::query_as(
            r"
            UPDATE registrations
            SET status = 'confirmed', updated_at = $3
            WHERE event_id = $1 AND user_id = $2 AND status = 'pending'
            RETURNING id, event_id, user_id, status, created_at, updated_at
            ",
        )
        .bind(event_id.value())
        .bind(user_id.value())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| LedgerError::Persistence(format!("Failed to confirm registration: {e}")))?
        .ok_or(LedgerError::RegistrationNotFound { event_id, user_id })?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::Persistence(format!("Failed to commit confirmation: {e}")))?;

        Registration::try_from(row)
    }

    async fn read_availability(&self, event_id: EventId) -> Result<Availability> {
        let row: AvailabilityRow = sqlx::query_as(
            r"
            SELECT e.capacity,
                   (SELECT COUNT(*)
                    FROM registrations r
                    WHERE r.event_id = e.id AND r.status = 'confirmed') AS confirmed
            FROM events e
            WHERE e.id = $1
            ",
        )
        .bind(event_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("Failed to read availability: {e}")))?
        .ok_or(LedgerError::EventNotFound(event_id))?;

        Ok(Availability {
            event_id,
            capacity: stored_capacity(event_id, row.capacity)?,
            confirmed: stored_count(row.confirmed)?,
        })
    }

    async fn active_registrants(&self, event_id: EventId) -> Result<Vec<Registrant>> {
        let rows: Vec<RegistrantRow> = sqlx::query_as(
            r"
            SELECT user_id, status, created_at
            FROM registrations
            WHERE event_id = $1 AND status <> 'cancelled'
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(event_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("Failed to list registrants: {e}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(Registrant {
                    user_id: UserId::new(row.user_id),
                    status: RegistrationStatus::parse(&row.status)?,
                    registered_at: row.created_at,
                })
            })
            .collect()
    }

    async fn active_for_user(&self, user_id: UserId) -> Result<Vec<UserRegistration>> {
        let rows: Vec<UserRegistrationRow> = sqlx::query_as(
            r"
            SELECT r.id, r.event_id, e.title, e.starts_at, e.location, r.status, r.created_at
            FROM registrations r
            JOIN events e ON e.id = r.event_id
            WHERE r.user_id = $1 AND r.status <> 'cancelled'
            ORDER BY e.starts_at DESC, r.id DESC
            ",
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("Failed to list user registrations: {e}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(UserRegistration {
                    registration_id: RegistrationId::new(row.id),
                    event_id: EventId::new(row.event_id),
                    event_title: row.title,
                    event_starts_at: row.starts_at,
                    location: row.location,
                    status: RegistrationStatus::parse(&row.status)?,
                    registered_at: row.created_at,
                })
            })
            .collect()
    }
}

/// Lock the event row for the rest of the transaction and return its capacity.
async fn lock_event(tx: &mut Transaction<'static, Postgres>, event_id: EventId) -> Result<Capacity> {
    let capacity: Option<i32> = sqlx::query_scalar(
        r"
        SELECT capacity
        FROM events
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(event_id.value())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| LedgerError::Persistence(format!("Failed to lock event: {e}")))?;

    match capacity {
        Some(capacity) => stored_capacity(event_id, capacity),
        None => Err(LedgerError::EventNotFound(event_id)),
    }
}

async fn lock_pair(
    tx: &mut Transaction<'static, Postgres>,
    event_id: EventId,
    user_id: UserId,
) -> Result<Option<RegistrationStatus>> {
    let status: Option<String> = sqlx::query_scalar(
        r"
        SELECT status
        FROM registrations
        WHERE event_id = $1 AND user_id = $2
        FOR UPDATE
        ",
    )
    .bind(event_id.value())
    .bind(user_id.value())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| LedgerError::Persistence(format!("Failed to read registration: {e}")))?;

    status.as_deref().map(RegistrationStatus::parse).transpose()
}

async fn count_confirmed(tx: &mut Transaction<'static, Postgres>, event_id: EventId) -> Result<u32> {
    let count: i64 = sqlx::query_scalar(
        r"
        SELECT COUNT(*)
        FROM registrations
        WHERE event_id = $1 AND status = 'confirmed'
        ",
    )
    .bind(event_id.value())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| LedgerError::Persistence(format!("Failed to count registrations: {e}")))?;

    stored_count(count)
}

fn stored_capacity(event_id: EventId, capacity: i32) -> Result<Capacity> {
    Capacity::try_from(capacity).map_err(|_| {
        LedgerError::Persistence(format!(
            "Invalid capacity {capacity} stored for event {event_id}"
        ))
    })
}

fn stored_count(count: i64) -> Result<u32> {
    u32::try_from(count)
        .map_err(|_| LedgerError::Persistence(format!("Registration count out of range: {count}")))
}

impl RegistrationStore for PostgresRegistrationStore {
    fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
        policy: ConfirmationPolicy,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(self.insert_or_reactivate(event_id, user_id, policy, now))
    }

    fn cancel(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(self.mark_cancelled(event_id, user_id, now))
    }

    fn confirm(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(self.mark_confirmed(event_id, user_id, now))
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
