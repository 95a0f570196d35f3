//! Health check endpoints.
//!
//! `GET /health` is a liveness probe and touches nothing. `GET /ready` asks a
//! [`ReadinessCheck`] (the server plugs in a database ping) and answers 503
//! while it fails.

use axum::{Json, extract::State, http::StatusCode};
use eventreg_core::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Readiness check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Dependency that was checked
    pub dependency: String,
    /// Failure detail when not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A dependency the service needs before it can take traffic.
pub trait ReadinessCheck: Send + Sync {
    /// Name reported in the readiness response.
    fn name(&self) -> &'static str;

    /// Probe the dependency.
    ///
    /// # Errors
    ///
    /// Returns a short description of the failure.
    fn check(&self) -> BoxFuture<'_, Result<(), String>>;
}

/// Liveness endpoint.
///
/// ```bash
/// curl http://localhost:8000/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness endpoint.
///
/// ```bash
/// curl http://localhost:8000/ready
/// # {"ready":true,"dependency":"postgres"}
/// ```
pub async fn readiness_check(
    State(check): State<Arc<dyn ReadinessCheck>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match check.check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                dependency: check.name().to_string(),
                error: None,
            }),
        ),
        Err(error) => {
            tracing::warn!(dependency = check.name(), %error, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    dependency: check.name().to_string(),
                    error: Some(error),
                }),
            )
        }
    }
}
