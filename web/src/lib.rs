//! Axum integration for the eventreg ledger.
//!
//! This crate holds the HTTP plumbing shared by eventreg services:
//!
//! - [`AppError`]: handler error type; every [`LedgerError`](eventreg_core::LedgerError)
//!   converts into it with the right status code
//! - [`extractors`]: bearer token extractor
//! - [`middleware`]: correlation id layer
//! - [`handlers::health`]: liveness and readiness endpoints
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract** the bearer token, path and JSON body
//! 3. **Authenticate** the token into a `UserId`
//! 4. **Call** the `RegistrationLedger`
//! 5. **Map** the result (or `LedgerError`) to an HTTP response
//!
//! # Example
//!
//! ```ignore
//! use eventreg_web::{AppError, WebResult};
//! use axum::{Router, routing::post, Json, extract::{Path, State}};
//!
//! async fn register(
//!     State(state): State<AppState>,
//!     user: AuthenticatedUser,
//!     Path(event_id): Path<i64>,
//! ) -> WebResult<Json<Registration>> {
//!     let registration = state.ledger.register(EventId::new(event_id), user.user_id).await?;
//!     Ok(Json(registration))
//! }
//!
//! let app = Router::new()
//!     .route("/api/v1/events/:id/register", post(register))
//!     .with_state(app_state);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::{AppError, ErrorResponse};
pub use extractors::BearerToken;
pub use handlers::{ReadinessCheck, health_check, readiness_check};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
