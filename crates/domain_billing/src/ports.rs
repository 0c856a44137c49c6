//! Persistence port for the billing domain

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, InvoiceId, Money, PolicyId, PortError, Rate};
use crate::invoice::{Invoice, PaymentStatus};

/// What billing needs to know about a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillablePolicy {
    pub policy_id: PolicyId,
    pub policy_number: String,
    /// Policy type code, used to pick emission rights
    pub policy_type: String,
    /// Base premium billed per invoice
    pub premium: Money,
    /// Retention agreed on the policy, if any
    pub withholding_rate: Option<Rate>,
}

#[async_trait]
pub trait BillingStore: DomainPort {
    async fn load_policy(&self, id: PolicyId) -> Result<BillablePolicy, PortError>;

    async fn save_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;

    async fn load_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// Writes a payment status change
    ///
    /// The write only lands while the stored invoice is still in
    /// `expected_status`; otherwise the store returns [`PortError::Conflict`]
    /// and leaves the invoice untouched.
    async fn update_invoice(
        &self,
        invoice: &Invoice,
        expected_status: PaymentStatus,
    ) -> Result<(), PortError>;

    /// Next invoice number sequence for a calendar year, starting at 1
    async fn next_invoice_sequence(&self, year: i32) -> Result<u32, PortError>;
}

/// In-memory store for tests and local development
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct InMemoryBillingStore {
        policies: RwLock<HashMap<PolicyId, BillablePolicy>>,
        invoices: RwLock<HashMap<InvoiceId, Invoice>>,
        sequences: RwLock<HashMap<i32, u32>>,
    }

    impl InMemoryBillingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn add_policy(&self, policy: BillablePolicy) {
            self.policies.write().await.insert(policy.policy_id, policy);
        }

        pub async fn invoices(&self) -> Vec<Invoice> {
            let mut all: Vec<_> = self.invoices.read().await.values().cloned().collect();
            all.sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
            all
        }
    }

    impl DomainPort for InMemoryBillingStore {}

    #[async_trait]
    impl BillingStore for InMemoryBillingStore {
        async fn load_policy(&self, id: PolicyId) -> Result<BillablePolicy, PortError> {
            self.policies
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Policy", id))
        }

        async fn save_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
            let mut invoices = self.invoices.write().await;
            if invoices.values().any(|i| i.invoice_number == invoice.invoice_number) {
                return Err(PortError::conflict(format!(
                    "invoice number {} already exists",
                    invoice.invoice_number
                )));
            }
            invoices.insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn load_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
            self.invoices
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }

        async fn update_invoice(
            &self,
            invoice: &Invoice,
            expected_status: PaymentStatus,
        ) -> Result<(), PortError> {
            let mut invoices = self.invoices.write().await;
            let stored = invoices
                .get(&invoice.id)
                .ok_or_else(|| PortError::not_found("Invoice", invoice.id))?;
            if stored.payment_status != expected_status {
                return Err(PortError::conflict(format!(
                    "invoice {} is {}, expected {}",
                    stored.invoice_number, stored.payment_status, expected_status
                )));
            }
            invoices.insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn next_invoice_sequence(&self, year: i32) -> Result<u32, PortError> {
            let mut sequences = self.sequences.write().await;
            let next = sequences.entry(year).or_insert(0);
            *next += 1;
            Ok(*next)
        }
    }
}
