//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter translates
//! between domain values and repository rows and maps [`DatabaseError`]
//! into [`core_kernel::PortError`].
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimStore;
//! use domain_claims::ClaimStore;
//!
//! let store: Arc<dyn ClaimStore> = Arc::new(PostgresClaimStore::new(pool));
//! ```

pub mod audit;
pub mod billing;
pub mod claims;

pub use audit::PostgresAuditSink;
pub use billing::PostgresBillingStore;
pub use claims::PostgresClaimStore;

use std::time::Instant;

use core_kernel::{Currency, HealthCheckResult};
use sqlx::PgPool;

use crate::error::DatabaseError;

/// Runs `SELECT 1` and reports the round trip
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {}", e)),
    }
}

pub(crate) fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    code.trim()
        .parse()
        .map_err(|e: core_kernel::MoneyError| DatabaseError::SerializationError(e.to_string()))
}
