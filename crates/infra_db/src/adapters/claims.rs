//! PostgreSQL claim store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AssetId, ClaimId, DocumentId, DomainPort, HealthCheckResult, HealthCheckable, Money,
    PolicyId, PortError, Role, TimelineEntryId, UserId,
};
use domain_claims::{
    Claim, ClaimDocument, ClaimStatus, ClaimStore, ClaimTimelineEntry, DocumentType,
};

use super::{parse_currency, ping};
use crate::error::DatabaseError;
use crate::repositories::claims::{
    ClaimRow, ClaimStatus as DbClaimStatus, ClaimsRepository, DocumentRow,
    DocumentType as DbDocumentType, TimelineRow, UserRole as DbUserRole,
};

/// `ClaimStore` backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresClaimStore {
    repository: ClaimsRepository,
    pool: PgPool,
}

impl PostgresClaimStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }
}

impl DomainPort for PostgresClaimStore {}

#[async_trait]
impl HealthCheckable for PostgresClaimStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-claim-store").await
    }
}

#[async_trait]
impl ClaimStore for PostgresClaimStore {
    #[instrument(skip(self), fields(policy_id = %policy_id))]
    async fn policy_exists(&self, policy_id: PolicyId) -> Result<bool, PortError> {
        Ok(self.repository.policy_exists(*policy_id.as_uuid()).await?)
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn load_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
        debug!("Loading claim");
        let row = self.repository.get_by_id(*id.as_uuid()).await?;
        Ok(row_to_claim(row)?)
    }

    #[instrument(skip(self, claim), fields(claim = %claim.claim_number))]
    async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError> {
        debug!("Inserting claim");
        Ok(self.repository.insert(&claim_to_row(claim)).await?)
    }

    #[instrument(skip(self, claim, entry), fields(claim = %claim.claim_number, expected_version))]
    async fn save_claim_with_timeline_entry(
        &self,
        claim: &Claim,
        entry: &ClaimTimelineEntry,
        expected_version: i64,
    ) -> Result<(), PortError> {
        debug!(to = %claim.status, "Saving claim status change");
        Ok(self
            .repository
            .update_with_timeline_entry(&claim_to_row(claim), &entry_to_row(entry), expected_version)
            .await?)
    }

    #[instrument(skip(self, claim), fields(claim = %claim.claim_number, expected_version))]
    async fn update_claim(&self, claim: &Claim, expected_version: i64) -> Result<(), PortError> {
        debug!("Updating claim");
        Ok(self.repository.update(&claim_to_row(claim), expected_version).await?)
    }

    #[instrument(skip(self), fields(claim_id = %claim_id))]
    async fn timeline(&self, claim_id: ClaimId) -> Result<Vec<ClaimTimelineEntry>, PortError> {
        let rows = self.repository.timeline_for(*claim_id.as_uuid()).await?;
        rows.into_iter()
            .map(|row| row_to_entry(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn save_document(&self, document: &ClaimDocument) -> Result<(), PortError> {
        debug!("Saving document metadata");
        Ok(self.repository.insert_document(&document_to_row(document)).await?)
    }

    #[instrument(skip(self), fields(claim_id = %claim_id))]
    async fn documents(&self, claim_id: ClaimId) -> Result<Vec<ClaimDocument>, PortError> {
        let rows = self.repository.documents_for(*claim_id.as_uuid()).await?;
        Ok(rows.into_iter().map(row_to_document).collect())
    }

    #[instrument(skip(self))]
    async fn next_claim_sequence(&self, year: i32) -> Result<u32, PortError> {
        let next = self.repository.next_sequence(year).await?;
        u32::try_from(next).map_err(|_| PortError::internal(format!("claim sequence {} out of range", next)))
    }

    #[instrument(skip(self))]
    async fn list_open_claims(&self) -> Result<Vec<Claim>, PortError> {
        let rows = self.repository.find_open().await?;
        rows.into_iter()
            .map(|row| row_to_claim(row).map_err(PortError::from))
            .collect()
    }
}

fn status_to_db(status: ClaimStatus) -> DbClaimStatus {
    match status {
        ClaimStatus::PendingValidation => DbClaimStatus::PendingValidation,
        ClaimStatus::InReview => DbClaimStatus::InReview,
        ClaimStatus::RequiresChanges => DbClaimStatus::RequiresChanges,
        ClaimStatus::Approved => DbClaimStatus::Approved,
        ClaimStatus::Liquidated => DbClaimStatus::Liquidated,
        ClaimStatus::Paid => DbClaimStatus::Paid,
        ClaimStatus::Rejected => DbClaimStatus::Rejected,
    }
}

fn db_to_status(status: DbClaimStatus) -> ClaimStatus {
    match status {
        DbClaimStatus::PendingValidation => ClaimStatus::PendingValidation,
        DbClaimStatus::InReview => ClaimStatus::InReview,
        DbClaimStatus::RequiresChanges => ClaimStatus::RequiresChanges,
        DbClaimStatus::Approved => ClaimStatus::Approved,
        DbClaimStatus::Liquidated => ClaimStatus::Liquidated,
        DbClaimStatus::Paid => ClaimStatus::Paid,
        DbClaimStatus::Rejected => ClaimStatus::Rejected,
    }
}

fn role_to_db(role: Role) -> DbUserRole {
    match role {
        Role::Custodian => DbUserRole::Custodian,
        Role::Manager => DbUserRole::Manager,
    }
}

fn db_to_role(role: DbUserRole) -> Role {
    match role {
        DbUserRole::Custodian => Role::Custodian,
        DbUserRole::Manager => Role::Manager,
    }
}

fn document_type_to_db(kind: DocumentType) -> DbDocumentType {
    match kind {
        DocumentType::InitialReport => DbDocumentType::InitialReport,
        DocumentType::Photos => DbDocumentType::Photos,
        DocumentType::PoliceReport => DbDocumentType::PoliceReport,
        DocumentType::Appraisal => DbDocumentType::Appraisal,
        DocumentType::Invoice => DbDocumentType::Invoice,
        DocumentType::Settlement => DbDocumentType::Settlement,
        DocumentType::Other => DbDocumentType::Other,
    }
}

fn db_to_document_type(kind: DbDocumentType) -> DocumentType {
    match kind {
        DbDocumentType::InitialReport => DocumentType::InitialReport,
        DbDocumentType::Photos => DocumentType::Photos,
        DbDocumentType::PoliceReport => DocumentType::PoliceReport,
        DbDocumentType::Appraisal => DocumentType::Appraisal,
        DbDocumentType::Invoice => DocumentType::Invoice,
        DbDocumentType::Settlement => DocumentType::Settlement,
        DbDocumentType::Other => DocumentType::Other,
    }
}

fn claim_to_row(claim: &Claim) -> ClaimRow {
    ClaimRow {
        claim_id: *claim.id.as_uuid(),
        claim_number: claim.claim_number.clone(),
        policy_id: *claim.policy_id.as_uuid(),
        asset_id: *claim.asset_id.as_uuid(),
        status: status_to_db(claim.status),
        description: claim.description.clone(),
        incident_date: claim.incident_date,
        incident_location: claim.incident_location.clone(),
        estimate: claim.estimate.amount(),
        settlement: claim.settlement.map(|s| s.amount()),
        currency: claim.estimate.currency().code().to_string(),
        reported_by: *claim.reported_by.as_uuid(),
        assigned_to: claim.assigned_to.map(|u| *u.as_uuid()),
        rejection_reason: claim.rejection_reason.clone(),
        payment_date: claim.payment_date,
        status_changed_at: claim.status_changed_at,
        created_at: claim.created_at,
        updated_at: claim.updated_at,
        version: claim.version,
    }
}

fn row_to_claim(row: ClaimRow) -> Result<Claim, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    Ok(Claim {
        id: ClaimId::from_uuid(row.claim_id),
        claim_number: row.claim_number,
        policy_id: PolicyId::from_uuid(row.policy_id),
        asset_id: AssetId::from_uuid(row.asset_id),
        status: db_to_status(row.status),
        description: row.description,
        incident_date: row.incident_date,
        incident_location: row.incident_location,
        estimate: Money::new(row.estimate, currency),
        settlement: row.settlement.map(|s| Money::new(s, currency)),
        reported_by: UserId::from_uuid(row.reported_by),
        assigned_to: row.assigned_to.map(UserId::from_uuid),
        rejection_reason: row.rejection_reason,
        payment_date: row.payment_date,
        status_changed_at: row.status_changed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        version: row.version,
    })
}

fn entry_to_row(entry: &ClaimTimelineEntry) -> TimelineRow {
    TimelineRow {
        entry_id: *entry.id.as_uuid(),
        claim_id: *entry.claim_id.as_uuid(),
        previous_status: status_to_db(entry.previous_status),
        new_status: status_to_db(entry.new_status),
        changed_by: *entry.changed_by.as_uuid(),
        actor_role: role_to_db(entry.actor_role),
        changed_at: entry.changed_at,
        ip_address: entry.ip_address.map(|ip| ip.to_string()),
        user_agent: entry.user_agent.clone(),
        notes: entry.notes.clone(),
    }
}

fn row_to_entry(row: TimelineRow) -> Result<ClaimTimelineEntry, DatabaseError> {
    let ip_address = row
        .ip_address
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e: std::net::AddrParseError| DatabaseError::SerializationError(e.to_string()))?;

    Ok(ClaimTimelineEntry {
        id: TimelineEntryId::from_uuid(row.entry_id),
        claim_id: ClaimId::from_uuid(row.claim_id),
        previous_status: db_to_status(row.previous_status),
        new_status: db_to_status(row.new_status),
        changed_by: UserId::from_uuid(row.changed_by),
        actor_role: db_to_role(row.actor_role),
        changed_at: row.changed_at,
        ip_address,
        user_agent: row.user_agent,
        notes: row.notes,
    })
}

fn document_to_row(document: &ClaimDocument) -> DocumentRow {
    DocumentRow {
        document_id: *document.id.as_uuid(),
        claim_id: *document.claim_id.as_uuid(),
        name: document.name.clone(),
        document_type: document_type_to_db(document.document_type),
        storage_key: document.storage_key.clone(),
        size_bytes: document.size_bytes,
        required: document.required,
        uploaded_by: *document.uploaded_by.as_uuid(),
        uploaded_at: document.uploaded_at,
    }
}

fn row_to_document(row: DocumentRow) -> ClaimDocument {
    ClaimDocument {
        id: DocumentId::from_uuid(row.document_id),
        claim_id: ClaimId::from_uuid(row.claim_id),
        name: row.name,
        document_type: db_to_document_type(row.document_type),
        storage_key: row.storage_key,
        size_bytes: row.size_bytes,
        required: row.required,
        uploaded_by: UserId::from_uuid(row.uploaded_by),
        uploaded_at: row.uploaded_at,
    }
}
