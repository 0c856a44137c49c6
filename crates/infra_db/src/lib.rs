//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the campus insurance system using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories own the SQL and
//! speak in row types; adapters implement the domain ports
//! (`ClaimStore`, `BillingStore`, `AuditSink`) on top of them.
//!
//! A claim status change and its timeline entry are written in one
//! transaction, guarded by the claim's `version` column.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresClaimStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/campus_insurance")).await?;
//! run_migrations(&pool).await?;
//! let claims = PostgresClaimStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PostgresAuditSink, PostgresBillingStore, PostgresClaimStore};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
