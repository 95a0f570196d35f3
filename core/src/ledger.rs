//! The registration ledger service.
//!
//! `RegistrationLedger` is what the request layer talks to. It does not hold
//! any mutable state of its own: every invariant is enforced by the injected
//! [`RegistrationStore`] inside one transaction per operation. The ledger adds
//! the time source, the confirmation policy, the per-operation deadline,
//! logging and metrics.
//!
//! # Deadlines
//!
//! Mutating operations run under a deadline (the configured default or one
//! supplied by the caller). When it expires the store future is dropped,
//! which rolls back its open transaction, and the caller receives
//! [`LedgerError::DeadlineExceeded`]. Nothing is retried here: conflicts are
//! terminal, and only the caller knows whether a persistence failure is
//! worth another attempt.
//!
//! # Example
//!
//! ```ignore
//! let ledger = RegistrationLedger::new(catalog, store, Arc::new(SystemClock), LedgerConfig::default());
//!
//! let registration = ledger.register(event_id, user_id).await?;
//! assert_eq!(registration.status, RegistrationStatus::Confirmed);
//!
//! ledger.cancel(event_id, user_id).await?;
//! ```

use crate::admission::ConfirmationPolicy;
use crate::catalog::EventCatalog;
use crate::environment::Clock;
use crate::error::{ErrorKind, LedgerError, Result};
use crate::store::RegistrationStore;
use crate::types::{
    Availability, EventId, Registrant, Registration, UserId, UserRegistration,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Ledger settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Status given to new registrations
    pub confirmation: ConfirmationPolicy,
    /// Default deadline for mutating operations (`None` = unbounded)
    pub operation_timeout: Option<Duration>,
}

impl LedgerConfig {
    /// Default deadline for register/cancel/confirm.
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            confirmation: ConfirmationPolicy::Automatic,
            operation_timeout: Some(Self::DEFAULT_OPERATION_TIMEOUT),
        }
    }
}

/// Capacity-bounded registration service.
///
/// Cheap to clone; all collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct RegistrationLedger {
    catalog: Arc<dyn EventCatalog>,
    store: Arc<dyn RegistrationStore>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl RegistrationLedger {
    /// Create a ledger over the given catalog and store.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn EventCatalog>,
        store: Arc<dyn RegistrationStore>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            config,
        }
    }

    /// Active settings.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Register `user_id` for `event_id` under the default deadline.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EventNotFound`]
    /// - [`LedgerError::AlreadyRegistered`]
    /// - [`LedgerError::CapacityExceeded`]
    /// - [`LedgerError::DeadlineExceeded`] / [`LedgerError::Persistence`]
    pub async fn register(&self, event_id: EventId, user_id: UserId) -> Result<Registration> {
        self.register_within(event_id, user_id, self.config.operation_timeout)
            .await
    }

    /// Register with a caller-supplied deadline.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    #[tracing::instrument(skip(self), name = "ledger_register")]
    pub async fn register_within(
        &self,
        event_id: EventId,
        user_id: UserId,
        deadline: Option<Duration>,
    ) -> Result<Registration> {
        let now = self.clock.now();
        let result = bounded(
            deadline,
            self.store
                .register(event_id, user_id, self.config.confirmation, now),
        )
        .await;

        record("eventreg_registrations_total", &result);
        match &result {
            Ok(registration) => tracing::info!(
                registration_id = %registration.id,
                status = %registration.status,
                "Registration accepted"
            ),
            Err(error) => log_failure(error, "Registration refused"),
        }
        result
    }

    /// Cancel the user's active registration under the default deadline.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::RegistrationNotFound`]
    /// - [`LedgerError::DeadlineExceeded`] / [`LedgerError::Persistence`]
    pub async fn cancel(&self, event_id: EventId, user_id: UserId) -> Result<()> {
        self.cancel_within(event_id, user_id, self.config.operation_timeout)
            .await
    }

    /// Cancel with a caller-supplied deadline.
    ///
    /// # Errors
    ///
    /// Same as [`Self::cancel`].
    #[tracing::instrument(skip(self), name = "ledger_cancel")]
    pub async fn cancel_within(
        &self,
        event_id: EventId,
        user_id: UserId,
        deadline: Option<Duration>,
    ) -> Result<()> {
        let now = self.clock.now();
        let result = bounded(deadline, self.store.cancel(event_id, user_id, now)).await;

        record("eventreg_cancellations_total", &result);
        match &result {
            Ok(registration) => {
                tracing::info!(registration_id = %registration.id, "Registration cancelled");
            }
            Err(error) => log_failure(error, "Cancellation refused"),
        }
        result.map(|_| ())
    }

    /// Confirm a pending registration (manual confirmation policy).
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EventNotFound`]
    /// - [`LedgerError::RegistrationNotFound`]
    /// - [`LedgerError::RegistrationNotPending`]
    /// - [`LedgerError::CapacityExceeded`]
    /// - [`LedgerError::DeadlineExceeded`] / [`LedgerError::Persistence`]
    pub async fn confirm(&self, event_id: EventId, user_id: UserId) -> Result<Registration> {
        self.confirm_within(event_id, user_id, self.config.operation_timeout)
            .await
    }

    /// Confirm with a caller-supplied deadline.
    ///
    /// # Errors
    ///
    /// Same as [`Self::confirm`].
    #[tracing::instrument(skip(self), name = "ledger_confirm")]
    pub async fn confirm_within(
        &self,
        event_id: EventId,
        user_id: UserId,
        deadline: Option<Duration>,
    ) -> Result<Registration> {
        let now = self.clock.now();
        let result = bounded(deadline, self.store.confirm(event_id, user_id, now)).await;

        record("eventreg_confirmations_total", &result);
        match &result {
            Ok(registration) => {
                tracing::info!(registration_id = %registration.id, "Registration confirmed");
            }
            Err(error) => log_failure(error, "Confirmation refused"),
        }
        result
    }

    /// Active registrants of the event, newest first.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EventNotFound`]
    /// - [`LedgerError::Persistence`]
    pub async fn list_registrants(&self, event_id: EventId) -> Result<Vec<Registrant>> {
        self.catalog.get_event(event_id).await?;
        self.store.list_registrants(event_id).await
    }

    /// Number of confirmed registrations for the event.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EventNotFound`]
    /// - [`LedgerError::Persistence`]
    pub async fn confirmed_count(&self, event_id: EventId) -> Result<u32> {
        self.store.confirmed_count(event_id).await
    }

    /// Capacity, confirmed count and open seats of the event.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EventNotFound`]
    /// - [`LedgerError::Persistence`]
    pub async fn availability(&self, event_id: EventId) -> Result<Availability> {
        self.store.availability(event_id).await
    }

    /// The user's active registrations.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Persistence`]
    pub async fn registrations_for_user(&self, user_id: UserId) -> Result<Vec<UserRegistration>> {
        self.store.registrations_for_user(user_id).await
    }
}

/// Run `operation` under an optional deadline.
async fn bounded<T, F>(deadline: Option<Duration>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| LedgerError::DeadlineExceeded(limit))?,
        None => operation.await,
    }
}

fn record<T>(counter: &'static str, result: &Result<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(error) => error.label(),
    };
    metrics::counter!(counter, "outcome" => outcome).increment(1);
}

fn log_failure(error: &LedgerError, what: &'static str) {
    match error.kind() {
        ErrorKind::Persistence => tracing::error!(%error, "{what}"),
        ErrorKind::NotFound | ErrorKind::Conflict | ErrorKind::Validation => {
            tracing::info!(reason = error.label(), %error, "{what}");
        }
    }
}
