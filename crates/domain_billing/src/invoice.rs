//! Invoice management
//!
//! An invoice freezes the calculator's breakdown for one policy and tracks
//! its payment status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{InvoiceId, PolicyId, UserId};
use crate::calculator::InvoiceBreakdown;
use crate::error::BillingError;

/// Formats an invoice number, e.g. `INV-2026-000007`
pub fn format_invoice_number(year: i32, sequence: u32) -> String {
    format!("INV-{}-{:06}", year, sequence)
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Issued, awaiting payment
    Pending,
    /// Paid in full
    Paid,
    /// Past due date and unpaid
    Overdue,
    /// Voided
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Paid) | (Pending, Overdue) | (Pending, Cancelled) | (Overdue, Paid) | (Overdue, Cancelled)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(BillingError::validation(format!("unknown payment status '{}'", other))),
        }
    }
}

/// A premium invoice for a policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Invoice number (human-readable)
    pub invoice_number: String,
    /// Related policy ID
    pub policy_id: PolicyId,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Calculated amounts
    pub breakdown: InvoiceBreakdown,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    /// Manager who generated the invoice
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a pending invoice
    pub fn issue(
        invoice_number: String,
        policy_id: PolicyId,
        invoice_date: NaiveDate,
        due_date: NaiveDate,
        breakdown: InvoiceBreakdown,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        if due_date <= invoice_date {
            return Err(BillingError::validation(format!(
                "due date {} must be after invoice date {}",
                due_date, invoice_date
            )));
        }

        Ok(Self {
            id: InvoiceId::new(),
            invoice_number,
            policy_id,
            invoice_date,
            due_date,
            breakdown,
            payment_status: PaymentStatus::Pending,
            payment_date: None,
            created_by,
            created_at: at,
            updated_at: at,
        })
    }

    fn move_to(&mut self, target: PaymentStatus, at: DateTime<Utc>) -> Result<PaymentStatus, BillingError> {
        let from = self.payment_status;
        if !from.can_transition_to(target) {
            return Err(BillingError::InvalidPaymentTransition { from, to: target });
        }
        self.payment_status = target;
        self.updated_at = at;
        Ok(from)
    }

    /// Marks the invoice paid on `payment_date`
    pub fn record_payment(&mut self, payment_date: NaiveDate, at: DateTime<Utc>) -> Result<PaymentStatus, BillingError> {
        if payment_date < self.invoice_date {
            return Err(BillingError::validation(format!(
                "payment date {} precedes invoice date {}",
                payment_date, self.invoice_date
            )));
        }
        let previous = self.move_to(PaymentStatus::Paid, at)?;
        self.payment_date = Some(payment_date);
        Ok(previous)
    }

    /// Marks the invoice overdue; only valid once `today` is past the due date
    pub fn mark_overdue(&mut self, today: NaiveDate, at: DateTime<Utc>) -> Result<PaymentStatus, BillingError> {
        if !self.is_past_due(today) {
            return Err(BillingError::validation(format!(
                "invoice {} is not due until {}",
                self.invoice_number, self.due_date
            )));
        }
        self.move_to(PaymentStatus::Overdue, at)
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<PaymentStatus, BillingError> {
        self.move_to(PaymentStatus::Cancelled, at)
    }

    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        today > self.due_date
    }

    /// Days between invoicing and the due date
    pub fn payment_term_days(&self) -> i64 {
        (self.due_date - self.invoice_date).num_days()
    }
}
