//! Event catalog API endpoints.
//!
//! - POST /api/v1/events - Create a new event
//! - GET /api/v1/events - List events with pagination
//! - GET /api/v1/events/:id - Get event details
//! - GET /api/v1/events/:id/availability - Seats left
//!
//! All endpoints require a bearer token.

use crate::auth::AuthenticatedUser;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use eventreg_core::{Capacity, Event, EventId, NewEvent, PageRequest};
use eventreg_web::AppError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a new event.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateEventRequest {
    /// Event title
    pub title: String,
    /// Event description
    #[serde(default)]
    pub description: String,
    /// Location
    pub location: String,
    /// Event start time
    pub starts_at: DateTime<Utc>,
    /// Seats (at least 1)
    pub capacity: u32,
}

/// Query parameters for listing events.
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Page number (0-indexed)
    #[serde(default)]
    pub page: u32,
    /// Page size (default: 20, max: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

const fn default_page_size() -> u32 {
    PageRequest::DEFAULT_PAGE_SIZE
}

/// Response for listing events.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEventsResponse {
    /// Events on this page
    pub events: Vec<Event>,
    /// Current page
    pub page: u32,
    /// Effective page size
    pub page_size: u32,
}

/// Seat availability of one event.
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    /// Event ID
    pub event_id: EventId,
    /// Total seats
    pub capacity: u32,
    /// Confirmed registrations
    pub confirmed: u32,
    /// Seats still open
    pub available: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new event.
///
/// The authenticated user becomes the event creator, the only user allowed
/// to confirm pending registrations.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8000/api/v1/events \
///   -H "Authorization: Bearer <session_token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "title": "Rust Meetup",
///     "description": "Monthly meetup",
///     "location": "Main Hall",
///     "starts_at": "2025-06-01T18:00:00Z",
///     "capacity": 50
///   }'
/// ```
pub async fn create_event(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let new_event = NewEvent {
        title: request.title,
        description: request.description,
        location: request.location,
        starts_at: request.starts_at,
        capacity: Capacity::new(request.capacity)?,
    };

    let event = state
        .catalog
        .create_event(new_event, user.user_id, state.clock.now())
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// List events, latest start time first.
///
/// ```bash
/// curl "http://localhost:8000/api/v1/events?page=0&page_size=20" \
///   -H "Authorization: Bearer <session_token>"
/// ```
pub async fn list_events(
    _user: AuthenticatedUser,
    Query(query): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, AppError> {
    let page = PageRequest::new(query.page, query.page_size);
    let events = state.catalog.list_events(page).await?;

    Ok(Json(ListEventsResponse {
        events,
        page: page.page,
        page_size: page.page_size,
    }))
}

/// Get event details by ID.
pub async fn get_event(
    _user: AuthenticatedUser,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Event>, AppError> {
    let event = state.catalog.get_event(EventId::new(event_id)).await?;
    Ok(Json(event))
}

/// Get seat availability of an event.
///
/// Response:
/// ```json
/// { "event_id": 1, "capacity": 50, "confirmed": 48, "available": 2 }
/// ```
pub async fn get_availability(
    _user: AuthenticatedUser,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let availability = state.ledger.availability(EventId::new(event_id)).await?;

    Ok(Json(AvailabilityResponse {
        event_id: availability.event_id,
        capacity: availability.capacity.get(),
        confirmed: availability.confirmed,
        available: availability.available(),
    }))
}
