//! Claims handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use core_kernel::{Actor, ClaimId, Currency, Money, RequestContext, UserId};
use domain_claims::{ClaimStatus, TransitionRequest};

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

/// Reports a new claim
pub async fn report_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<ReportClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    request.validate()?;
    let currency = match &request.currency {
        Some(code) => code.parse::<Currency>(),
        None => state.config.default_currency(),
    }
    .map_err(|e| ApiError::Validation(e.to_string()))?;

    let claim = state
        .claims
        .report_claim(request.into_new_claim(currency), &actor, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<ClaimId>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.get_claim(id).await?;
    Ok(Json(claim.into()))
}

/// Open claims past their status threshold; managers only
pub async fn list_overdue(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    if !actor.is_manager() {
        return Err(ApiError::Forbidden("only managers may list overdue claims".to_string()));
    }
    let claims = state.claims.overdue_claims(Utc::now()).await?;
    Ok(Json(claims.into_iter().map(Into::into).collect()))
}

/// Moves a claim to a new status
pub async fn transition_claim(
    State(state): State<AppState>,
    Path(id): Path<ClaimId>,
    Extension(actor): Extension<Actor>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<TransitionClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    request.validate()?;
    let target: ClaimStatus = request.status.parse()?;

    let mut transition = TransitionRequest::to(target);
    if let Some(amount) = request.settlement {
        // Settlement is always in the claim's own currency
        let currency = state.claims.get_claim(id).await?.estimate.currency();
        transition = transition.with_settlement(Money::new(amount, currency));
    }
    if let Some(reason) = request.reason {
        transition = transition.with_reason(reason);
    }
    if let Some(notes) = request.notes {
        transition = transition.with_notes(notes);
    }

    let claim = state
        .claims
        .transition_with(id, transition, &actor, &context)
        .await?;
    Ok(Json(claim.into()))
}

/// Status history of a claim, oldest first
pub async fn get_timeline(
    State(state): State<AppState>,
    Path(id): Path<ClaimId>,
) -> Result<Json<Vec<TimelineEntryResponse>>, ApiError> {
    let entries = state.claims.timeline(id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Attaches document metadata to a claim
pub async fn attach_document(
    State(state): State<AppState>,
    Path(id): Path<ClaimId>,
    Extension(actor): Extension<Actor>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<AttachDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    request.validate()?;
    let document = state
        .claims
        .attach_document(id, request.into(), &actor, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(document.into())))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<ClaimId>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let documents = state.claims.documents(id).await?;
    Ok(Json(documents.into_iter().map(Into::into).collect()))
}

/// Assigns the handling manager
pub async fn assign_claim(
    State(state): State<AppState>,
    Path(id): Path<ClaimId>,
    Extension(actor): Extension<Actor>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<AssignClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state
        .claims
        .assign(id, UserId::from_uuid(request.manager_id), &actor, &context)
        .await?;
    Ok(Json(claim.into()))
}
