//! Invoice service
//!
//! Builds an [`InvoiceConfig`] for a policy, runs the calculator, stores the
//! invoice and drives its payment status.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use core_kernel::{
    dispatch_notification, Actor, AuditRecord, AuditSink, InvoiceId, NotificationEvent,
    NotificationKind, NotificationPort, PolicyId, RequestContext,
};

use crate::calculator::{compute_invoice, InvoiceConfig};
use crate::emission::EmissionRightsSchedule;
use crate::error::BillingError;
use crate::invoice::{format_invoice_number, Invoice, PaymentStatus};
use crate::ports::{BillablePolicy, BillingStore};

/// Days between invoice and due date that still earn the early-payment discount
pub const DEFAULT_EARLY_PAYMENT_WINDOW_DAYS: i64 = 20;

/// Tenant-wide billing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSettings {
    /// Rates and caps; per-invoice flags are filled in by the service
    pub rates: InvoiceConfig,
    pub emission_rights: EmissionRightsSchedule,
    pub early_payment_window_days: i64,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            rates: InvoiceConfig::default(),
            emission_rights: EmissionRightsSchedule::standard(),
            early_payment_window_days: DEFAULT_EARLY_PAYMENT_WINDOW_DAYS,
        }
    }
}

impl BillingSettings {
    /// Invoice configuration for one policy and payment term
    pub fn config_for(&self, policy: &BillablePolicy, term_days: i64) -> InvoiceConfig {
        let mut config = self.rates.clone();
        config.emission_rights = Some(
            self.emission_rights
                .resolve(&policy.policy_type, &policy.premium),
        );
        config.early_payment = term_days <= self.early_payment_window_days;
        match policy.withholding_rate {
            Some(rate) if !rate.as_decimal().is_zero() => {
                config.withholding = true;
                config.withholding_rate = rate;
            }
            _ => {
                config.withholding = false;
            }
        }
        config
    }
}

/// Dates for a new invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Entry point for invoice generation and payment tracking
///
/// Every operation is restricted to managers.
#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn BillingStore>,
    notifier: Arc<dyn NotificationPort>,
    audit: Arc<dyn AuditSink>,
    settings: BillingSettings,
}

impl InvoiceService {
    pub fn new(
        store: Arc<dyn BillingStore>,
        notifier: Arc<dyn NotificationPort>,
        audit: Arc<dyn AuditSink>,
        settings: BillingSettings,
    ) -> Self {
        Self { store, notifier, audit, settings }
    }

    pub fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    fn require_manager(actor: &Actor, action: &str) -> Result<(), BillingError> {
        if actor.is_manager() {
            return Ok(());
        }
        warn!(user = %actor.user_id, role = %actor.role, action, "Billing action refused");
        Err(BillingError::Unauthorized(format!("only managers may {}", action)))
    }

    /// Calculates and stores a new invoice for a policy
    ///
    /// # Arguments
    ///
    /// * `policy_id` - Policy to bill; its premium, type and retention drive
    ///   the calculation
    /// * `request` - Invoice and due dates; a term within the early-payment
    ///   window earns the discount
    ///
    /// # Returns
    ///
    /// The stored invoice in `pending` with its full breakdown
    ///
    /// # Errors
    ///
    /// * `BillingError::PolicyNotFound` - unknown policy
    /// * `BillingError::Validation` - due date not after the invoice date
    /// * `BillingError::InvalidPremium` / `InvalidConfiguration` - from the calculator
    #[instrument(skip(self, request, context), fields(user = %actor.user_id))]
    pub async fn generate_invoice(
        &self,
        policy_id: PolicyId,
        request: InvoiceRequest,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Invoice, BillingError> {
        Self::require_manager(actor, "generate invoices")?;

        let policy = self.store.load_policy(policy_id).await?;
        if request.due_date <= request.invoice_date {
            return Err(BillingError::validation(format!(
                "due date {} must be after invoice date {}",
                request.due_date, request.invoice_date
            )));
        }

        let term_days = (request.due_date - request.invoice_date).num_days();
        let config = self.settings.config_for(&policy, term_days);
        let breakdown = compute_invoice(policy.premium, &config)?;

        let sequence = self
            .store
            .next_invoice_sequence(request.invoice_date.year())
            .await?;
        let invoice = Invoice::issue(
            format_invoice_number(request.invoice_date.year(), sequence),
            policy.policy_id,
            request.invoice_date,
            request.due_date,
            breakdown,
            actor.user_id,
            context.received_at,
        )?;
        self.store.save_invoice(&invoice).await?;

        info!(
            invoice = %invoice.invoice_number,
            policy = %policy.policy_number,
            total = %invoice.breakdown.total,
            early_payment = config.early_payment,
            "Invoice generated"
        );

        self.audit_after_commit(
            AuditRecord::new(
                "create",
                "invoice",
                invoice.id,
                format!("Invoice {} generated for policy {}", invoice.invoice_number, policy.policy_number),
                invoice.created_at,
            )
            .by(actor.user_id)
            .with_values(None, serde_json::to_value(&invoice.breakdown).ok())
            .from_client(context.ip_address, context.user_agent.clone()),
        )
        .await;

        dispatch_notification(
            self.notifier.clone(),
            NotificationEvent::new(
                NotificationKind::InvoiceGenerated,
                &invoice.invoice_number,
                vec![actor.user_id],
                format!(
                    "Invoice {} for {} is due on {}",
                    invoice.invoice_number, invoice.breakdown.total, invoice.due_date
                ),
            ),
        );

        Ok(invoice)
    }

    pub async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, BillingError> {
        Ok(self.store.load_invoice(invoice_id).await?)
    }

    /// Records full payment on `payment_date`
    ///
    /// Status changes are checked against the stored status at write time; a
    /// request that loses a race with another change gets
    /// `BillingError::ConcurrentModification`.
    #[instrument(skip(self, context), fields(user = %actor.user_id))]
    pub async fn record_payment(
        &self,
        invoice_id: InvoiceId,
        payment_date: NaiveDate,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Invoice, BillingError> {
        Self::require_manager(actor, "record payments")?;
        let mut invoice = self.store.load_invoice(invoice_id).await?;
        let previous = invoice.record_payment(payment_date, context.received_at)?;
        self.commit_status_change(invoice, previous, "payment", actor, context).await
    }

    /// Flags an unpaid invoice whose due date has passed
    #[instrument(skip(self, context), fields(user = %actor.user_id))]
    pub async fn mark_overdue(
        &self,
        invoice_id: InvoiceId,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Invoice, BillingError> {
        Self::require_manager(actor, "mark invoices overdue")?;
        let mut invoice = self.store.load_invoice(invoice_id).await?;
        let previous = invoice.mark_overdue(context.received_at.date_naive(), context.received_at)?;
        self.commit_status_change(invoice, previous, "status_change", actor, context).await
    }

    #[instrument(skip(self, context), fields(user = %actor.user_id))]
    pub async fn cancel(
        &self,
        invoice_id: InvoiceId,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Invoice, BillingError> {
        Self::require_manager(actor, "cancel invoices")?;
        let mut invoice = self.store.load_invoice(invoice_id).await?;
        let previous = invoice.cancel(context.received_at)?;
        self.commit_status_change(invoice, previous, "status_change", actor, context).await
    }

    async fn commit_status_change(
        &self,
        invoice: Invoice,
        previous: PaymentStatus,
        action: &str,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Invoice, BillingError> {
        self.store.update_invoice(&invoice, previous).await?;

        info!(
            invoice = %invoice.invoice_number,
            from = %previous,
            to = %invoice.payment_status,
            "Invoice status changed"
        );

        self.audit_after_commit(
            AuditRecord::new(
                action,
                "invoice",
                invoice.id,
                format!(
                    "Invoice {} moved from {} to {}",
                    invoice.invoice_number, previous, invoice.payment_status
                ),
                invoice.updated_at,
            )
            .by(actor.user_id)
            .with_values(
                Some(json!({ "payment_status": previous })),
                Some(json!({
                    "payment_status": invoice.payment_status,
                    "payment_date": invoice.payment_date,
                })),
            )
            .from_client(context.ip_address, context.user_agent.clone()),
        )
        .await;

        dispatch_notification(
            self.notifier.clone(),
            NotificationEvent::new(
                NotificationKind::InvoiceStatusChanged,
                &invoice.invoice_number,
                vec![invoice.created_by, actor.user_id],
                format!("Invoice {} is now {}", invoice.invoice_number, invoice.payment_status),
            ),
        );

        Ok(invoice)
    }

    async fn audit_after_commit(&self, record: AuditRecord) {
        let action = record.action.clone();
        let entity_id = record.entity_id.clone();
        if let Err(e) = self.audit.record(record).await {
            warn!(action = %action, entity = %entity_id, error = %e, "Audit hand-off failed");
        }
    }
}
