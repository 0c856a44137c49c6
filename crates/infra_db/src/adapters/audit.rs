//! PostgreSQL audit sink

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{AuditRecord, AuditSink, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use super::ping;
use crate::repositories::audit::{AuditRepository, AuditRow};

/// Appends audit records to the `audit_log` table
#[derive(Debug, Clone)]
pub struct PostgresAuditSink {
    repository: AuditRepository,
    pool: PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AuditRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresAuditSink {}

#[async_trait]
impl HealthCheckable for PostgresAuditSink {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-audit-sink").await
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    #[instrument(skip(self, record), fields(action = %record.action, entity = %record.entity_id))]
    async fn record(&self, record: AuditRecord) -> Result<(), PortError> {
        Ok(self.repository.insert(&record_to_row(record)).await?)
    }
}

fn record_to_row(record: AuditRecord) -> AuditRow {
    AuditRow {
        audit_id: *record.id.as_uuid(),
        action: record.action,
        entity_type: record.entity_type,
        entity_id: record.entity_id,
        user_id: record.user_id.map(|u| *u.as_uuid()),
        description: record.description,
        old_values: record.old_values,
        new_values: record.new_values,
        ip_address: record.ip_address.map(|ip| ip.to_string()),
        user_agent: record.user_agent,
        recorded_at: record.recorded_at,
    }
}
