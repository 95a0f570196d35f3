//! Eventreg HTTP server.
//!
//! Serves the registration ledger over a JSON API:
//!
//! - **Events**: create, list and read events; seat availability
//! - **Registrations**: register, cancel, confirm; registrant listings
//! - **Sessions**: bearer tokens resolved to a `UserId` by an [`auth::Authenticator`]
//!
//! # Architecture
//!
//! ```text
//! HTTP ──▶ axum handlers ──▶ RegistrationLedger ──▶ RegistrationStore (PostgreSQL)
//!              │                    │
//!              │                    └──▶ EventCatalog
//!              └──▶ Authenticator (bearer token → UserId)
//! ```
//!
//! Capacity and uniqueness are enforced inside the store transaction; the
//! HTTP layer only authenticates and maps errors to status codes.

#![forbid(unsafe_code)]

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod metrics;
pub mod server;

pub use auth::{AuthError, AuthenticatedUser, Authenticator, SessionTokenAuthenticator};
pub use config::Config;
pub use server::{AppState, build_router};
