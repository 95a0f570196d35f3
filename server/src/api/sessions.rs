//! Development session endpoint.
//!
//! `POST /api/v1/sessions` mints a bearer token for any user id. It exists so
//! the API can be exercised without an identity provider and answers 403
//! unless `AUTH_ALLOW_DEV_SESSIONS=true`.

use crate::auth::IssuedToken;
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use eventreg_core::UserId;
use eventreg_web::AppError;
use serde::Deserialize;

/// Request body for `POST /api/v1/sessions`.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// User to issue the token for
    pub user_id: UserId,
}

/// Issue a session token.
///
/// ```bash
/// curl -X POST http://localhost:8000/api/v1/sessions \
///   -H "Content-Type: application/json" \
///   -d '{"user_id": 42}'
/// # {"token":"...","user_id":42,"expires_at":"..."}
/// ```
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<IssuedToken>), AppError> {
    if !state.allow_dev_sessions {
        return Err(AppError::forbidden("Development sessions are disabled"));
    }

    let issued = state.authenticator.issue_token(request.user_id).await;
    Ok((StatusCode::CREATED, Json(issued)))
}
