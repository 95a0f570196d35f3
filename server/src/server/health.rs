//! Readiness probe for the eventreg server.
//!
//! The generic `/health` and `/ready` handlers live in `eventreg-web`; this
//! module supplies the `PostgreSQL` dependency they check.

use eventreg_core::BoxFuture;
use eventreg_web::ReadinessCheck;
use sqlx::PgPool;

/// Pings `PostgreSQL` with `SELECT 1`.
#[derive(Clone)]
pub struct PostgresReadiness {
    pool: PgPool,
}

impl PostgresReadiness {
    /// Create a probe over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ping(&self) -> Result<(), String> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

impl ReadinessCheck for PostgresReadiness {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn check(&self) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(self.ping())
    }
}
