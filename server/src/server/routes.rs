//! Router configuration for the eventreg service.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{events, registrations, sessions};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use eventreg_web::{correlation_id_layer, health_check, readiness_check};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Configures:
/// - Health checks (`/health`, `/ready`, no authentication)
/// - Session issuance (`/api/v1/sessions`)
/// - Event catalog and registration endpoints under `/api/v1`
///
/// Every request gets an HTTP trace span wrapping a correlation span. The
/// correlation span is the innermost, so the authenticated user is recorded
/// on it.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Sessions
        .route("/sessions", post(sessions::create_session))
        // Event catalog
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/availability", get(events::get_availability))
        // Registrations
        .route(
            "/events/:id/register",
            post(registrations::register).delete(registrations::cancel),
        )
        .route(
            "/events/:id/registrations/:user_id/confirm",
            post(registrations::confirm),
        )
        .route("/events/:id/registrants", get(registrations::list_registrants))
        .route("/users/me/registrations", get(registrations::my_registrations));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api/v1", api_routes)
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured origins.
///
/// `*` (or an empty list) allows any origin. Origins that are not valid
/// header values are skipped with a warning.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
