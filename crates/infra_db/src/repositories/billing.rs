//! Billing repository implementation
//!
//! Database access for billable policies and premium invoices.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const INVOICE_COLUMNS: &str = r#"
    invoice_id, invoice_number, policy_id, invoice_date, due_date, currency,
    premium, vat, superintendence, rural_insurance, emission_rights, subtotal,
    early_payment_discount, withholding, total, payment_status, payment_date,
    created_by, created_at, updated_at
"#;

/// Repository for policies and invoices
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_policy(&self, policy_id: Uuid) -> Result<PolicyRow, DatabaseError> {
        sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT policy_id, policy_number, policy_type, premium, currency, withholding_rate
            FROM policies
            WHERE policy_id = $1
            "#,
        )
        .bind(policy_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Policy", policy_id))
    }

    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<InvoiceRow, DatabaseError> {
        let sql = format!("SELECT {} FROM invoices WHERE invoice_id = $1", INVOICE_COLUMNS);
        sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Invoice", invoice_id))
    }

    pub async fn insert_invoice(&self, invoice: &InvoiceRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, policy_id, invoice_date, due_date, currency,
                premium, vat, superintendence, rural_insurance, emission_rights, subtotal,
                early_payment_discount, withholding, total, payment_status, payment_date,
                created_by, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.policy_id)
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(&invoice.currency)
        .bind(invoice.premium)
        .bind(invoice.vat)
        .bind(invoice.superintendence)
        .bind(invoice.rural_insurance)
        .bind(invoice.emission_rights)
        .bind(invoice.subtotal)
        .bind(invoice.early_payment_discount)
        .bind(invoice.withholding)
        .bind(invoice.total)
        .bind(invoice.payment_status)
        .bind(invoice.payment_date)
        .bind(invoice.created_by)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Writes the payment status columns; amounts are immutable
    ///
    /// The update is conditional on the stored status still being
    /// `expected_status`. When no row matches, a follow-up read tells a
    /// missing invoice apart from one another writer already moved.
    pub async fn update_payment_status(
        &self,
        invoice: &InvoiceRow,
        expected_status: PaymentStatus,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET payment_status = $2, payment_date = $3, updated_at = $4
            WHERE invoice_id = $1 AND payment_status = $5
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(invoice.payment_status)
        .bind(invoice.payment_date)
        .bind(invoice.updated_at)
        .bind(expected_status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current: Option<PaymentStatus> = sqlx::query_scalar(
                "SELECT payment_status FROM invoices WHERE invoice_id = $1",
            )
            .bind(invoice.invoice_id)
            .fetch_optional(&self.pool)
            .await?;

            return Err(match current {
                None => DatabaseError::not_found("Invoice", invoice.invoice_id),
                Some(status) => DatabaseError::Conflict(format!(
                    "invoice {} is {:?}, expected {:?}",
                    invoice.invoice_number, status, expected_status
                )),
            });
        }
        Ok(())
    }

    pub async fn next_sequence(&self, year: i32) -> Result<i32, DatabaseError> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO invoice_number_sequences (year, last_value) VALUES ($1, 1)
            ON CONFLICT (year) DO UPDATE
                SET last_value = invoice_number_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolicyRow {
    pub policy_id: Uuid,
    pub policy_number: String,
    pub policy_type: String,
    pub premium: Decimal,
    pub currency: String,
    pub withholding_rate: Option<Decimal>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub policy_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub premium: Decimal,
    pub vat: Decimal,
    pub superintendence: Decimal,
    pub rural_insurance: Decimal,
    pub emission_rights: Decimal,
    pub subtotal: Decimal,
    pub early_payment_discount: Decimal,
    pub withholding: Decimal,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
