//! Error types for web handlers.
//!
//! [`AppError`] is what every handler returns on failure. Ledger errors
//! convert into it by [`ErrorKind`]:
//!
//! | Kind          | Status |
//! |---------------|--------|
//! | `NotFound`    | 404    |
//! | `Conflict`    | 409    |
//! | `Validation`  | 422    |
//! | `Persistence` | 503 (deadline or store outage, retryable) |

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use eventreg_core::{ErrorKind, LedgerError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application error type for web handlers.
///
/// Carries the HTTP status, a user-facing message, a stable machine-readable
/// code, and optionally the internal error (logged, never sent to clients).
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Event>, AppError> {
///     let event = state.catalog.get_event(id).await?;
///     Ok(Json(event))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Whether clients may retry the same request
    retryable: bool,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            retryable: false,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    ///
    /// Responses carry `Retry-After: 1`.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            ..Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                message.into(),
                "SERVICE_UNAVAILABLE".to_string(),
            )
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (for client error handling).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        }

        let retryable = self.retryable;
        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        let mut response = (self.status, Json(body)).into_response();
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

/// Map ledger failures to HTTP responses.
///
/// Business-rule messages are safe to show to clients; persistence details
/// are replaced by a generic message and kept as the logged source.
impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let code = err.label().to_ascii_uppercase();
        match err.kind() {
            ErrorKind::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string(), code),
            ErrorKind::Conflict => Self::new(StatusCode::CONFLICT, err.to_string(), code),
            ErrorKind::Validation => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), code)
            }
            ErrorKind::Persistence => Self {
                code,
                ..Self::unavailable("The registration service is temporarily unavailable")
                    .with_source(anyhow::Error::new(err))
            },
        }
    }
}
