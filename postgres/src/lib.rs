//! `PostgreSQL` storage for eventreg.
//!
//! This crate implements the `EventCatalog` and `RegistrationStore` traits
//! from `eventreg-core` on top of sqlx. It provides:
//!
//! - Pool construction and embedded migrations ([`pool`])
//! - The event catalog ([`PostgresEventCatalog`])
//! - The registration ledger store with per-event row locking
//!   ([`PostgresRegistrationStore`])
//!
//! # Example
//!
//! ```ignore
//! use eventreg_postgres::{connect, migrate, PoolSettings, PostgresEventCatalog, PostgresRegistrationStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = connect(&PoolSettings::new("postgres://localhost/eventreg")).await?;
//!     migrate(&pool).await?;
//!
//!     let catalog = PostgresEventCatalog::new(pool.clone());
//!     let store = PostgresRegistrationStore::new(pool);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod pool;
pub mod registrations;

pub use catalog::PostgresEventCatalog;
pub use pool::{PoolSettings, SetupError, connect, migrate};
pub use registrations::PostgresRegistrationStore;
