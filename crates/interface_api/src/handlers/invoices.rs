//! Invoice handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use core_kernel::{Actor, InvoiceId, PolicyId, RequestContext};
use domain_billing::InvoiceRequest;

use crate::dto::invoices::*;
use crate::{error::ApiError, AppState};

/// Generates an invoice for a policy's premium
pub async fn generate_invoice(
    State(state): State<AppState>,
    Path(policy_id): Path<PolicyId>,
    Extension(actor): Extension<Actor>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<GenerateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let invoice_request = InvoiceRequest {
        invoice_date: request
            .invoice_date
            .unwrap_or_else(|| context.received_at.date_naive()),
        due_date: request.due_date,
    };

    let invoice = state
        .invoices
        .generate_invoice(policy_id, invoice_request, &actor, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.invoices.get_invoice(id).await?;
    Ok(Json(invoice.into()))
}

/// Records full payment
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Extension(actor): Extension<Actor>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let payment_date = request
        .payment_date
        .unwrap_or_else(|| context.received_at.date_naive());
    let invoice = state
        .invoices
        .record_payment(id, payment_date, &actor, &context)
        .await?;
    Ok(Json(invoice.into()))
}

pub async fn mark_overdue(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Extension(actor): Extension<Actor>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.invoices.mark_overdue(id, &actor, &context).await?;
    Ok(Json(invoice.into()))
}

pub async fn cancel_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Extension(actor): Extension<Actor>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.invoices.cancel(id, &actor, &context).await?;
    Ok(Json(invoice.into()))
}
