//! Invoice DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_billing::{Invoice, InvoiceBreakdown};

#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceRequest {
    /// Defaults to the day the request is received
    pub invoice_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    /// Defaults to the day the request is received
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BreakdownResponse {
    pub premium: Decimal,
    pub vat: Decimal,
    pub superintendence: Decimal,
    pub rural_insurance: Decimal,
    pub emission_rights: Decimal,
    pub subtotal: Decimal,
    pub early_payment_discount: Decimal,
    pub withholding: Decimal,
    pub total: Decimal,
}

impl From<InvoiceBreakdown> for BreakdownResponse {
    fn from(b: InvoiceBreakdown) -> Self {
        Self {
            premium: b.premium.amount(),
            vat: b.vat.amount(),
            superintendence: b.superintendence.amount(),
            rural_insurance: b.rural_insurance.amount(),
            emission_rights: b.emission_rights.amount(),
            subtotal: b.subtotal.amount(),
            early_payment_discount: b.early_payment_discount.amount(),
            withholding: b.withholding.amount(),
            total: b.total.amount(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub policy_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub breakdown: BreakdownResponse,
    pub payment_status: String,
    pub payment_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: *invoice.id.as_uuid(),
            invoice_number: invoice.invoice_number,
            policy_id: *invoice.policy_id.as_uuid(),
            invoice_date: invoice.invoice_date,
            due_date: invoice.due_date,
            currency: invoice.breakdown.premium.currency().code().to_string(),
            breakdown: invoice.breakdown.into(),
            payment_status: invoice.payment_status.as_str().to_string(),
            payment_date: invoice.payment_date,
            created_by: *invoice.created_by.as_uuid(),
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}
