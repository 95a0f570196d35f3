//! Registration API endpoints.
//!
//! - POST /api/v1/events/:id/register - Register the caller
//! - DELETE /api/v1/events/:id/register - Cancel the caller's registration
//! - POST /api/v1/events/:id/registrations/:user_id/confirm - Confirm a pending registration (creator only)
//! - GET /api/v1/events/:id/registrants - Active registrants, newest first
//! - GET /api/v1/users/me/registrations - The caller's active registrations
//!
//! The principal always comes from the bearer token. A caller can only
//! register or cancel for themselves.

use crate::auth::AuthenticatedUser;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eventreg_core::{EventId, Registrant, Registration, UserId, UserRegistration};
use eventreg_web::AppError;

/// Register the caller for an event.
///
/// Returns 409 when the caller is already registered or the event is full.
///
/// ```bash
/// curl -X POST http://localhost:8000/api/v1/events/1/register \
///   -H "Authorization: Bearer <session_token>"
/// ```
pub async fn register(
    user: AuthenticatedUser,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    let registration = state
        .ledger
        .register(EventId::new(event_id), user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// Cancel the caller's registration.
///
/// Returns 404 when the caller holds no active registration.
pub async fn cancel(
    user: AuthenticatedUser,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state
        .ledger
        .cancel(EventId::new(event_id), user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Confirm a pending registration.
///
/// Only the event creator may confirm; anyone else gets 403.
pub async fn confirm(
    user: AuthenticatedUser,
    Path((event_id, registrant)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Result<Json<Registration>, AppError> {
    let event_id = EventId::new(event_id);
    let event = state.catalog.get_event(event_id).await?;
    if event.creator_id != user.user_id {
        return Err(AppError::forbidden(
            "Only the event creator can confirm registrations",
        ));
    }

    let registration = state
        .ledger
        .confirm(event_id, UserId::new(registrant))
        .await?;
    Ok(Json(registration))
}

/// Active registrants of an event, newest first.
pub async fn list_registrants(
    _user: AuthenticatedUser,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Registrant>>, AppError> {
    let registrants = state.ledger.list_registrants(EventId::new(event_id)).await?;
    Ok(Json(registrants))
}

/// The caller's active registrations, latest event first.
pub async fn my_registrations(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserRegistration>>, AppError> {
    let registrations = state.ledger.registrations_for_user(user.user_id).await?;
    Ok(Json(registrations))
}
