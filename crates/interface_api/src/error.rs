//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_billing::BillingError;
use domain_claims::ClaimError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        let message = err.to_string();
        match err {
            ClaimError::ClaimNotFound(_) | ClaimError::PolicyNotFound(_) => ApiError::NotFound(message),
            ClaimError::Unauthorized(_) => ApiError::Forbidden(message),
            ClaimError::InvalidTransition { .. }
            | ClaimError::ConcurrentModification(_)
            | ClaimError::ClaimClosed(_) => ApiError::Conflict(message),
            ClaimError::InvalidSettlement(_) | ClaimError::Validation(_) => ApiError::Validation(message),
            ClaimError::Persistence(_) => ApiError::Internal(message),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        let message = err.to_string();
        match err {
            BillingError::PolicyNotFound(_) | BillingError::InvoiceNotFound(_) => ApiError::NotFound(message),
            BillingError::Unauthorized(_) => ApiError::Forbidden(message),
            BillingError::InvalidPaymentTransition { .. } | BillingError::ConcurrentModification(_) => {
                ApiError::Conflict(message)
            }
            BillingError::InvalidPremium(_)
            | BillingError::InvalidConfiguration(_)
            | BillingError::Validation(_) => ApiError::Validation(message),
            BillingError::Persistence(_) => ApiError::Internal(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::Unauthorized
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PortError;
    use domain_billing::PaymentStatus;
    use domain_claims::ClaimStatus;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_claim_error_statuses() {
        assert_eq!(status_of(ClaimError::ClaimNotFound("CLM-1".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ClaimError::unauthorized("custodian")), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(ClaimError::InvalidTransition { from: ClaimStatus::Paid, to: ClaimStatus::InReview }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(ClaimError::PolicyNotFound("POL-9".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ClaimError::ConcurrentModification("v2".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(ClaimError::InvalidSettlement("too high".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_of(ClaimError::Persistence(PortError::connection("down"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_billing_error_statuses() {
        assert_eq!(status_of(BillingError::PolicyNotFound("POL-1".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(BillingError::InvalidPaymentTransition { from: PaymentStatus::Paid, to: PaymentStatus::Cancelled }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BillingError::ConcurrentModification("already paid".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(BillingError::InvalidPremium("zero".into())), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
