//! Authentication boundary.
//!
//! The ledger only ever sees a [`UserId`]. How a bearer token becomes one is
//! behind the [`Authenticator`] trait, so a deployment can swap in an
//! identity provider without touching the handlers.
//!
//! # Usage
//!
//! ```rust,ignore
//! // Require authentication
//! async fn my_registrations(
//!     user: AuthenticatedUser,
//!     State(state): State<AppState>,
//! ) -> Result<Json<Vec<UserRegistration>>, AppError> {
//!     Ok(Json(state.ledger.registrations_for_user(user.user_id).await?))
//! }
//! ```

use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use eventreg_core::{BoxFuture, Clock, UserId};
use eventreg_web::{AppError, BearerToken};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Authentication failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token is unknown (never issued or revoked).
    #[error("Invalid session token")]
    InvalidToken,

    /// The token was valid but its session has ended.
    #[error("Session expired")]
    Expired,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self::unauthorized(err.to_string())
    }
}

/// A freshly issued session token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// Opaque bearer token
    pub token: String,
    /// User the token authenticates
    pub user_id: UserId,
    /// When the token stops working
    pub expires_at: DateTime<Utc>,
}

/// Turns bearer tokens into principals.
pub trait Authenticator: Send + Sync {
    /// Issue a new token for `user_id`.
    fn issue_token(&self, user_id: UserId) -> BoxFuture<'_, IssuedToken>;

    /// Resolve a token to the user it was issued for.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidToken`] if the token is unknown
    /// - [`AuthError::Expired`] if its session has ended
    fn authenticate<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<UserId, AuthError>>;
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

type TokenDigest = [u8; 32];

/// Random opaque session tokens held in process memory.
///
/// Tokens are 256 random bits, base64url encoded. Only their SHA-256
/// digest is stored, so a dump of the session table cannot be replayed.
/// Sessions do not survive a restart.
pub struct SessionTokenAuthenticator {
    sessions: RwLock<HashMap<TokenDigest, Session>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionTokenAuthenticator {
    /// Create an authenticator whose sessions last `ttl`.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }

    /// Number of sessions currently held, expired or not.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Sweep expired sessions every `every` on a background task.
    ///
    /// The task holds only a weak reference and ends once the authenticator
    /// is dropped. Must be called from within a Tokio runtime.
    pub fn spawn_reaper(self: &Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        let authenticator = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(authenticator) = authenticator.upgrade() else {
                    break;
                };
                let removed = authenticator.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "Expired sessions purged");
                }
            }
        })
    }

    fn generate_token() -> String {
        let mut random_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut random_bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }

    fn digest(token: &str) -> TokenDigest {
        Sha256::digest(token.as_bytes()).into()
    }

    async fn issue(&self, user_id: UserId) -> IssuedToken {
        let token = Self::generate_token();
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.sessions
            .write()
            .await
            .insert(Self::digest(&token), Session { user_id, expires_at });

        tracing::info!(user_id = %user_id, %expires_at, "Session issued");
        IssuedToken {
            token,
            user_id,
            expires_at,
        }
    }

    async fn resolve(&self, token: &str) -> Result<UserId, AuthError> {
        let digest = Self::digest(token);
        let session = self
            .sessions
            .read()
            .await
            .get(&digest)
            .copied()
            .ok_or(AuthError::InvalidToken)?;

        if session.expires_at <= self.clock.now() {
            self.sessions.write().await.remove(&digest);
            return Err(AuthError::Expired);
        }
        Ok(session.user_id)
    }
}

impl Authenticator for SessionTokenAuthenticator {
    fn issue_token(&self, user_id: UserId) -> BoxFuture<'_, IssuedToken> {
        Box::pin(self.issue(user_id))
    }

    fn authenticate<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<UserId, AuthError>> {
        Box::pin(self.resolve(token))
    }
}

/// Authenticated principal.
///
/// Use this as a handler parameter to require a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    /// The authenticated user ID
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        let user_id = state.authenticator.authenticate(bearer.as_str()).await?;
        tracing::Span::current().record("user_id", tracing::field::display(user_id));
        Ok(Self { user_id })
    }
}
