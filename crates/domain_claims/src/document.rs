//! Claim document metadata
//!
//! File bytes live in external storage; only the storage key and metadata
//! are kept here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, DocumentId, UserId};
use crate::error::ClaimError;

/// Kind of supporting document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    InitialReport,
    Photos,
    PoliceReport,
    Appraisal,
    Invoice,
    Settlement,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::InitialReport => "initial_report",
            DocumentType::Photos => "photos",
            DocumentType::PoliceReport => "police_report",
            DocumentType::Appraisal => "appraisal",
            DocumentType::Invoice => "invoice",
            DocumentType::Settlement => "settlement",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial_report" => Ok(DocumentType::InitialReport),
            "photos" => Ok(DocumentType::Photos),
            "police_report" => Ok(DocumentType::PoliceReport),
            "appraisal" => Ok(DocumentType::Appraisal),
            "invoice" => Ok(DocumentType::Invoice),
            "settlement" => Ok(DocumentType::Settlement),
            "other" => Ok(DocumentType::Other),
            other => Err(ClaimError::validation(format!("unknown document type '{}'", other))),
        }
    }
}

/// Metadata for a document being attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub name: String,
    pub document_type: DocumentType,
    pub storage_key: String,
    pub size_bytes: i64,
    pub required: bool,
}

/// A document attached to a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDocument {
    pub id: DocumentId,
    pub claim_id: ClaimId,
    pub name: String,
    pub document_type: DocumentType,
    pub storage_key: String,
    pub size_bytes: i64,
    pub required: bool,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
}

impl ClaimDocument {
    pub fn new(
        claim_id: ClaimId,
        new: NewDocument,
        uploaded_by: UserId,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        if new.name.trim().is_empty() {
            return Err(ClaimError::validation("document name must not be empty"));
        }
        if new.storage_key.trim().is_empty() {
            return Err(ClaimError::validation("document storage key must not be empty"));
        }
        if new.size_bytes <= 0 {
            return Err(ClaimError::validation(format!(
                "document size must be positive, got {}",
                new.size_bytes
            )));
        }

        Ok(Self {
            id: DocumentId::new(),
            claim_id,
            name: new.name.trim().to_string(),
            document_type: new.document_type,
            storage_key: new.storage_key,
            size_bytes: new.size_bytes,
            required: new.required,
            uploaded_by,
            uploaded_at,
        })
    }
}
