//! HTTP request handlers shared by eventreg services.

pub mod health;

pub use health::{ReadinessCheck, health_check, readiness_check};
