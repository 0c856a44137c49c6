//! Claims domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use crate::workflow::ClaimStatus;

/// Errors that can occur in the claims domain
///
/// Every variant is a recoverable condition returned to the caller; the
/// workflow never swallows one of them.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: ClaimStatus, to: ClaimStatus },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Claim was modified concurrently: {0}")]
    ConcurrentModification(String),

    #[error("Invalid settlement: {0}")]
    InvalidSettlement(String),

    #[error("Claim {0} is closed")]
    ClaimClosed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(PortError),
}

impl ClaimError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ClaimError::Unauthorized(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }
}

impl From<PortError> for ClaimError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } if entity_type == "Policy" => {
                ClaimError::PolicyNotFound(id)
            }
            PortError::NotFound { id, .. } => ClaimError::ClaimNotFound(id),
            PortError::Conflict { message } => ClaimError::ConcurrentModification(message),
            other => ClaimError::Persistence(other),
        }
    }
}

impl From<MoneyError> for ClaimError {
    fn from(error: MoneyError) -> Self {
        ClaimError::InvalidSettlement(error.to_string())
    }
}
