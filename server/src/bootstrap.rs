//! Wiring of the production components.

use crate::auth::SessionTokenAuthenticator;
use crate::config::Config;
use crate::server::{AppState, PostgresReadiness};
use eventreg_core::{Clock, EventCatalog, RegistrationLedger, RegistrationStore, SystemClock};
use eventreg_postgres::{PostgresEventCatalog, PostgresRegistrationStore};
use sqlx::PgPool;
use std::sync::Arc;

/// Build the application state over a `PostgreSQL` pool.
///
/// The catalog, store and readiness probe share `pool`; time comes from the
/// system clock. Also starts the expired-session sweeper, so this must run
/// inside a Tokio runtime.
#[must_use]
pub fn postgres_state(pool: PgPool, config: &Config) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let catalog: Arc<dyn EventCatalog> = Arc::new(PostgresEventCatalog::new(pool.clone()));
    let store: Arc<dyn RegistrationStore> = Arc::new(PostgresRegistrationStore::new(pool.clone()));

    let ledger = RegistrationLedger::new(
        catalog.clone(),
        store,
        clock.clone(),
        config.ledger_config(),
    );
    let authenticator = Arc::new(SessionTokenAuthenticator::new(
        config.session_ttl(),
        clock.clone(),
    ));
    authenticator.spawn_reaper(config.session_purge_interval());

    AppState::new(
        ledger,
        catalog,
        authenticator,
        clock,
        Arc::new(PostgresReadiness::new(pool)),
    )
    .with_dev_sessions(config.auth.allow_dev_sessions)
}
