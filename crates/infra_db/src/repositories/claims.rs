//! Claims repository implementation
//!
//! Database access for claims, their status timeline and document metadata.
//! Writes to an existing claim are version-checked; a status change and its
//! timeline entry share one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = r#"
    claim_id, claim_number, policy_id, asset_id, status, description,
    incident_date, incident_location, estimate, settlement, currency,
    reported_by, assigned_to, rejection_reason, payment_date,
    status_changed_at, created_at, updated_at, version
"#;

/// Repository for claims data
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a claim by its identifier
    pub async fn get_by_id(&self, claim_id: Uuid) -> Result<ClaimRow, DatabaseError> {
        let sql = format!("SELECT {} FROM claims WHERE claim_id = $1", CLAIM_COLUMNS);
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))
    }

    /// Whether a policy row exists for `policy_id`
    pub async fn policy_exists(&self, policy_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM policies WHERE policy_id = $1)")
            .bind(policy_id)
            .fetch_one(&self.pool)
            .await?)
    }

    /// Claims not in a terminal status, oldest claim number first
    pub async fn find_open(&self) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM claims WHERE status NOT IN ('paid', 'rejected') ORDER BY claim_number",
            CLAIM_COLUMNS
        );
        Ok(sqlx::query_as::<_, ClaimRow>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn insert(&self, claim: &ClaimRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claims (
                claim_id, claim_number, policy_id, asset_id, status, description,
                incident_date, incident_location, estimate, settlement, currency,
                reported_by, assigned_to, rejection_reason, payment_date,
                status_changed_at, created_at, updated_at, version
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19
            )
            "#,
        )
        .bind(claim.claim_id)
        .bind(&claim.claim_number)
        .bind(claim.policy_id)
        .bind(claim.asset_id)
        .bind(claim.status)
        .bind(&claim.description)
        .bind(claim.incident_date)
        .bind(&claim.incident_location)
        .bind(claim.estimate)
        .bind(claim.settlement)
        .bind(&claim.currency)
        .bind(claim.reported_by)
        .bind(claim.assigned_to)
        .bind(&claim.rejection_reason)
        .bind(claim.payment_date)
        .bind(claim.status_changed_at)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .bind(claim.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Version-checked update of the mutable claim columns
    pub async fn update(&self, claim: &ClaimRow, expected_version: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        Self::update_in(&mut tx, claim, expected_version).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Updates the claim and appends the timeline entry in one transaction
    pub async fn update_with_timeline_entry(
        &self,
        claim: &ClaimRow,
        entry: &TimelineRow,
        expected_version: i64,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        Self::update_in(&mut tx, claim, expected_version).await?;

        sqlx::query(
            r#"
            INSERT INTO claim_timeline (
                entry_id, claim_id, previous_status, new_status, changed_by,
                actor_role, changed_at, ip_address, user_agent, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.entry_id)
        .bind(entry.claim_id)
        .bind(entry.previous_status)
        .bind(entry.new_status)
        .bind(entry.changed_by)
        .bind(entry.actor_role)
        .bind(entry.changed_at)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.notes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        claim: &ClaimRow,
        expected_version: i64,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE claims SET
                status = $3,
                settlement = $4,
                assigned_to = $5,
                rejection_reason = $6,
                payment_date = $7,
                status_changed_at = $8,
                updated_at = $9,
                version = $10
            WHERE claim_id = $1 AND version = $2
            "#,
        )
        .bind(claim.claim_id)
        .bind(expected_version)
        .bind(claim.status)
        .bind(claim.settlement)
        .bind(claim.assigned_to)
        .bind(&claim.rejection_reason)
        .bind(claim.payment_date)
        .bind(claim.status_changed_at)
        .bind(claim.updated_at)
        .bind(claim.version)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM claims WHERE claim_id = $1")
            .bind(claim.claim_id)
            .fetch_optional(&mut **tx)
            .await?;

        match current {
            None => Err(DatabaseError::not_found("Claim", claim.claim_id)),
            Some(version) => Err(DatabaseError::Conflict(format!(
                "claim {} is at version {}, expected {}",
                claim.claim_number, version, expected_version
            ))),
        }
    }

    pub async fn timeline_for(&self, claim_id: Uuid) -> Result<Vec<TimelineRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, TimelineRow>(
            r#"
            SELECT entry_id, claim_id, previous_status, new_status, changed_by,
                   actor_role, changed_at, ip_address, user_agent, notes
            FROM claim_timeline
            WHERE claim_id = $1
            ORDER BY changed_at, entry_id
            "#,
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn insert_document(&self, document: &DocumentRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claim_documents (
                document_id, claim_id, name, document_type, storage_key,
                size_bytes, required, uploaded_by, uploaded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(document.document_id)
        .bind(document.claim_id)
        .bind(&document.name)
        .bind(document.document_type)
        .bind(&document.storage_key)
        .bind(document.size_bytes)
        .bind(document.required)
        .bind(document.uploaded_by)
        .bind(document.uploaded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn documents_for(&self, claim_id: Uuid) -> Result<Vec<DocumentRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT document_id, claim_id, name, document_type, storage_key,
                   size_bytes, required, uploaded_by, uploaded_at
            FROM claim_documents
            WHERE claim_id = $1
            ORDER BY uploaded_at
            "#,
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Atomically claims the next claim-number sequence for `year`
    pub async fn next_sequence(&self, year: i32) -> Result<i32, DatabaseError> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO claim_number_sequences (year, last_value) VALUES ($1, 1)
            ON CONFLICT (year) DO UPDATE
                SET last_value = claim_number_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await?)
    }
}

/// Claim status as stored in PostgreSQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum ClaimStatus {
    PendingValidation,
    InReview,
    RequiresChanges,
    Approved,
    Liquidated,
    Paid,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Custodian,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "document_type", rename_all = "snake_case")]
pub enum DocumentType {
    InitialReport,
    Photos,
    PoliceReport,
    Appraisal,
    Invoice,
    Settlement,
    Other,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub claim_number: String,
    pub policy_id: Uuid,
    pub asset_id: Uuid,
    pub status: ClaimStatus,
    pub description: String,
    pub incident_date: NaiveDate,
    pub incident_location: Option<String>,
    pub estimate: Decimal,
    pub settlement: Option<Decimal>,
    pub currency: String,
    pub reported_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub status_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TimelineRow {
    pub entry_id: Uuid,
    pub claim_id: Uuid,
    pub previous_status: ClaimStatus,
    pub new_status: ClaimStatus,
    pub changed_by: Uuid,
    pub actor_role: UserRole,
    pub changed_at: DateTime<Utc>,
    /// Stored as text, parsed back by the adapter
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub document_id: Uuid,
    pub claim_id: Uuid,
    pub name: String,
    pub document_type: DocumentType,
    pub storage_key: String,
    pub size_bytes: i64,
    pub required: bool,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}
