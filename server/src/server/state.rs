//! Application state for the eventreg HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Registration ledger (all seat-affecting operations)
//! - Event catalog (event reads and creation)
//! - Authenticator (bearer token validation)
//! - Readiness probe (database ping)

use crate::auth::Authenticator;
use axum::extract::FromRef;
use eventreg_core::{Clock, EventCatalog, RegistrationLedger};
use eventreg_web::ReadinessCheck;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Registration ledger
    pub ledger: RegistrationLedger,

    /// Event catalog, shared with the ledger
    pub catalog: Arc<dyn EventCatalog>,

    /// Bearer token validation
    pub authenticator: Arc<dyn Authenticator>,

    /// Time source for event creation
    pub clock: Arc<dyn Clock>,

    /// Dependency probed by `GET /ready`
    pub readiness: Arc<dyn ReadinessCheck>,

    /// Whether `POST /api/v1/sessions` may mint tokens
    pub allow_dev_sessions: bool,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Dev sessions start disabled; see [`AppState::with_dev_sessions`].
    #[must_use]
    pub fn new(
        ledger: RegistrationLedger,
        catalog: Arc<dyn EventCatalog>,
        authenticator: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
        readiness: Arc<dyn ReadinessCheck>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            authenticator,
            clock,
            readiness,
            allow_dev_sessions: false,
        }
    }

    /// Enable or disable the development session endpoint.
    #[must_use]
    pub fn with_dev_sessions(mut self, allow: bool) -> Self {
        self.allow_dev_sessions = allow;
        self
    }
}

// Lets `readiness_check` extract its probe from AppState
impl FromRef<AppState> for Arc<dyn ReadinessCheck> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.readiness.clone()
    }
}
