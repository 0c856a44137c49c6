//! Claims DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{AssetId, Currency, Money, PolicyId};
use domain_claims::{Claim, ClaimDocument, ClaimTimelineEntry, DocumentType, NewClaim, NewDocument};

#[derive(Debug, Deserialize, Validate)]
pub struct ReportClaimRequest {
    pub policy_id: Uuid,
    pub asset_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    pub incident_date: NaiveDate,
    #[validate(length(max = 255))]
    pub incident_location: Option<String>,
    pub estimate: Decimal,
    /// ISO code; the configured currency when omitted
    pub currency: Option<String>,
}

impl ReportClaimRequest {
    pub fn into_new_claim(self, currency: Currency) -> NewClaim {
        NewClaim {
            policy_id: PolicyId::from_uuid(self.policy_id),
            asset_id: AssetId::from_uuid(self.asset_id),
            description: self.description,
            incident_date: self.incident_date,
            incident_location: self.incident_location,
            estimate: Money::new(self.estimate, currency),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransitionClaimRequest {
    /// Target status, e.g. `in_review`
    pub status: String,
    /// Settlement amount when liquidating; defaults to the estimate
    pub settlement: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignClaimRequest {
    pub manager_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachDocumentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub document_type: DocumentType,
    #[validate(length(min = 1, max = 500))]
    pub storage_key: String,
    #[validate(range(min = 1))]
    pub size_bytes: i64,
    #[serde(default)]
    pub required: bool,
}

impl From<AttachDocumentRequest> for NewDocument {
    fn from(request: AttachDocumentRequest) -> Self {
        NewDocument {
            name: request.name,
            document_type: request.document_type,
            storage_key: request.storage_key,
            size_bytes: request.size_bytes,
            required: request.required,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub id: Uuid,
    pub claim_number: String,
    pub policy_id: Uuid,
    pub asset_id: Uuid,
    pub status: String,
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
    pub allowed_transitions: Vec<String>,
    pub status_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        Self {
            id: *claim.id.as_uuid(),
            claim_number: claim.claim_number,
            policy_id: *claim.policy_id.as_uuid(),
            asset_id: *claim.asset_id.as_uuid(),
            status: claim.status.as_str().to_string(),
            description: claim.description,
            incident_date: claim.incident_date,
            incident_location: claim.incident_location,
            estimate: claim.estimate.amount(),
            settlement: claim.settlement.map(|s| s.amount()),
            currency: claim.estimate.currency().code().to_string(),
            reported_by: *claim.reported_by.as_uuid(),
            assigned_to: claim.assigned_to.map(|u| *u.as_uuid()),
            rejection_reason: claim.rejection_reason,
            payment_date: claim.payment_date,
            allowed_transitions: claim
                .status
                .allowed_targets()
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            status_changed_at: claim.status_changed_at,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
            version: claim.version,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimelineEntryResponse {
    pub id: Uuid,
    pub previous_status: String,
    pub new_status: String,
    pub changed_by: Uuid,
    pub actor_role: String,
    pub changed_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub notes: Option<String>,
}

impl From<ClaimTimelineEntry> for TimelineEntryResponse {
    fn from(entry: ClaimTimelineEntry) -> Self {
        Self {
            id: *entry.id.as_uuid(),
            previous_status: entry.previous_status.as_str().to_string(),
            new_status: entry.new_status.as_str().to_string(),
            changed_by: *entry.changed_by.as_uuid(),
            actor_role: entry.actor_role.as_str().to_string(),
            changed_at: entry.changed_at,
            ip_address: entry.ip_address.map(|ip| ip.to_string()),
            user_agent: entry.user_agent,
            notes: entry.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub name: String,
    pub document_type: DocumentType,
    pub storage_key: String,
    pub size_bytes: i64,
    pub required: bool,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

impl From<ClaimDocument> for DocumentResponse {
    fn from(document: ClaimDocument) -> Self {
        Self {
            id: *document.id.as_uuid(),
            name: document.name,
            document_type: document.document_type,
            storage_key: document.storage_key,
            size_bytes: document.size_bytes,
            required: document.required,
            uploaded_by: *document.uploaded_by.as_uuid(),
            uploaded_at: document.uploaded_at,
        }
    }
}
