//! Audit log repository

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, row: &AuditRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                audit_id, action, entity_type, entity_id, user_id, description,
                old_values, new_values, ip_address, user_agent, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(row.audit_id)
        .bind(&row.action)
        .bind(&row.entity_type)
        .bind(&row.entity_id)
        .bind(row.user_id)
        .bind(&row.description)
        .bind(&row.old_values)
        .bind(&row.new_values)
        .bind(&row.ip_address)
        .bind(&row.user_agent)
        .bind(row.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Audit history of one entity, oldest first
    pub async fn find_by_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<AuditRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT audit_id, action, entity_type, entity_id, user_id, description,
                   old_values, new_values, ip_address, user_agent, recorded_at
            FROM audit_log
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY recorded_at
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    pub audit_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub user_id: Option<Uuid>,
    pub description: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
