//! HTTP server module for the eventreg service.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Readiness probing
//! - Graceful shutdown handling
//! - Router configuration

pub mod health;
pub mod lifecycle;
pub mod routes;
pub mod state;

pub use health::PostgresReadiness;
pub use lifecycle::shutdown_signal;
pub use routes::{build_router, cors_layer};
pub use state::AppState;
