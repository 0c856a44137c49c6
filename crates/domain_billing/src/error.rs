//! Billing domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use crate::invoice::PaymentStatus;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Premium is zero or negative
    #[error("Invalid premium: {0}")]
    InvalidPremium(String),

    /// A rate, emission right or derived amount is out of bounds
    #[error("Invalid invoice configuration: {0}")]
    InvalidConfiguration(String),

    /// Policy not found
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment status change not allowed
    #[error("Invalid payment status transition from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Another request changed the invoice first
    #[error("Invoice was modified concurrently: {0}")]
    ConcurrentModification(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(PortError),
}

impl BillingError {
    pub fn configuration(message: impl Into<String>) -> Self {
        BillingError::InvalidConfiguration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }
}

impl From<PortError> for BillingError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } if entity_type == "Policy" => {
                BillingError::PolicyNotFound(id)
            }
            PortError::NotFound { entity_type, id } if entity_type == "Invoice" => {
                BillingError::InvoiceNotFound(id)
            }
            PortError::Conflict { message } => BillingError::ConcurrentModification(message),
            other => BillingError::Persistence(other),
        }
    }
}

impl From<MoneyError> for BillingError {
    fn from(error: MoneyError) -> Self {
        BillingError::InvalidConfiguration(error.to_string())
    }
}
