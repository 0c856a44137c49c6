//! PostgreSQL billing store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, Money, PolicyId, PortError, Rate,
    UserId,
};
use domain_billing::{BillablePolicy, BillingStore, Invoice, InvoiceBreakdown, PaymentStatus};

use super::{parse_currency, ping};
use crate::error::DatabaseError;
use crate::repositories::billing::{
    BillingRepository, InvoiceRow, PaymentStatus as DbPaymentStatus, PolicyRow,
};

/// `BillingStore` backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresBillingStore {
    repository: BillingRepository,
    pool: PgPool,
}

impl PostgresBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillingRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresBillingStore {}

#[async_trait]
impl HealthCheckable for PostgresBillingStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-billing-store").await
    }
}

#[async_trait]
impl BillingStore for PostgresBillingStore {
    #[instrument(skip(self), fields(policy_id = %id))]
    async fn load_policy(&self, id: PolicyId) -> Result<BillablePolicy, PortError> {
        let row = self.repository.get_policy(*id.as_uuid()).await?;
        Ok(row_to_policy(row)?)
    }

    #[instrument(skip(self, invoice), fields(invoice = %invoice.invoice_number))]
    async fn save_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        debug!(total = %invoice.breakdown.total, "Inserting invoice");
        Ok(self.repository.insert_invoice(&invoice_to_row(invoice)).await?)
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn load_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        let row = self.repository.get_invoice(*id.as_uuid()).await?;
        Ok(row_to_invoice(row)?)
    }

    #[instrument(skip(self, invoice), fields(invoice = %invoice.invoice_number))]
    async fn update_invoice(
        &self,
        invoice: &Invoice,
        expected_status: PaymentStatus,
    ) -> Result<(), PortError> {
        debug!(from = %expected_status, to = %invoice.payment_status, "Updating invoice payment status");
        Ok(self
            .repository
            .update_payment_status(&invoice_to_row(invoice), status_to_db(expected_status))
            .await?)
    }

    #[instrument(skip(self))]
    async fn next_invoice_sequence(&self, year: i32) -> Result<u32, PortError> {
        let next = self.repository.next_sequence(year).await?;
        u32::try_from(next).map_err(|_| PortError::internal(format!("invoice sequence {} out of range", next)))
    }
}

fn status_to_db(status: PaymentStatus) -> DbPaymentStatus {
    match status {
        PaymentStatus::Pending => DbPaymentStatus::Pending,
        PaymentStatus::Paid => DbPaymentStatus::Paid,
        PaymentStatus::Overdue => DbPaymentStatus::Overdue,
        PaymentStatus::Cancelled => DbPaymentStatus::Cancelled,
    }
}

fn db_to_status(status: DbPaymentStatus) -> PaymentStatus {
    match status {
        DbPaymentStatus::Pending => PaymentStatus::Pending,
        DbPaymentStatus::Paid => PaymentStatus::Paid,
        DbPaymentStatus::Overdue => PaymentStatus::Overdue,
        DbPaymentStatus::Cancelled => PaymentStatus::Cancelled,
    }
}

fn row_to_policy(row: PolicyRow) -> Result<BillablePolicy, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    Ok(BillablePolicy {
        policy_id: PolicyId::from_uuid(row.policy_id),
        policy_number: row.policy_number,
        policy_type: row.policy_type,
        premium: Money::new(row.premium, currency),
        withholding_rate: row.withholding_rate.map(Rate::new),
    })
}

fn invoice_to_row(invoice: &Invoice) -> InvoiceRow {
    let b = &invoice.breakdown;
    InvoiceRow {
        invoice_id: *invoice.id.as_uuid(),
        invoice_number: invoice.invoice_number.clone(),
        policy_id: *invoice.policy_id.as_uuid(),
        invoice_date: invoice.invoice_date,
        due_date: invoice.due_date,
        currency: b.premium.currency().code().to_string(),
        premium: b.premium.amount(),
        vat: b.vat.amount(),
        superintendence: b.superintendence.amount(),
        rural_insurance: b.rural_insurance.amount(),
        emission_rights: b.emission_rights.amount(),
        subtotal: b.subtotal.amount(),
        early_payment_discount: b.early_payment_discount.amount(),
        withholding: b.withholding.amount(),
        total: b.total.amount(),
        payment_status: status_to_db(invoice.payment_status),
        payment_date: invoice.payment_date,
        created_by: *invoice.created_by.as_uuid(),
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    }
}

fn row_to_invoice(row: InvoiceRow) -> Result<Invoice, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    let money = |amount| Money::new(amount, currency);

    Ok(Invoice {
        id: InvoiceId::from_uuid(row.invoice_id),
        invoice_number: row.invoice_number,
        policy_id: PolicyId::from_uuid(row.policy_id),
        invoice_date: row.invoice_date,
        due_date: row.due_date,
        breakdown: InvoiceBreakdown {
            premium: money(row.premium),
            vat: money(row.vat),
            superintendence: money(row.superintendence),
            rural_insurance: money(row.rural_insurance),
            emission_rights: money(row.emission_rights),
            subtotal: money(row.subtotal),
            early_payment_discount: money(row.early_payment_discount),
            withholding: money(row.withholding),
            total: money(row.total),
        },
        payment_status: db_to_status(row.payment_status),
        payment_date: row.payment_date,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
