//! Test Data Builders
//!
//! Builders for domain inputs with sensible defaults, plus harnesses that
//! wire the services to in-memory adapters. Tests specify only the fields
//! they care about.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::mock::{MemoryAuditSink, RecordingNotifier};
use core_kernel::{AssetId, Money, PolicyId, Rate};
use domain_billing::ports::mock::InMemoryBillingStore;
use domain_billing::{BillablePolicy, BillingSettings, InvoiceService};
use domain_claims::ports::mock::InMemoryClaimStore;
use domain_claims::{ClaimWorkflowService, NewClaim};

use crate::fixtures::{MoneyFixtures, TemporalFixtures, TextFixtures};

/// Builder for [`NewClaim`]
pub struct NewClaimBuilder {
    policy_id: PolicyId,
    asset_id: AssetId,
    description: String,
    incident_date: NaiveDate,
    incident_location: Option<String>,
    estimate: Money,
}

impl Default for NewClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewClaimBuilder {
    pub fn new() -> Self {
        Self {
            policy_id: PolicyId::new(),
            asset_id: AssetId::new(),
            description: TextFixtures::description(),
            incident_date: TemporalFixtures::incident_date(),
            incident_location: Some(TextFixtures::location()),
            estimate: MoneyFixtures::usd_estimate(),
        }
    }

    pub fn with_policy_id(mut self, id: PolicyId) -> Self {
        self.policy_id = id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_incident_date(mut self, date: NaiveDate) -> Self {
        self.incident_date = date;
        self
    }

    pub fn with_estimate(mut self, estimate: Money) -> Self {
        self.estimate = estimate;
        self
    }

    pub fn build(self) -> NewClaim {
        NewClaim {
            policy_id: self.policy_id,
            asset_id: self.asset_id,
            description: self.description,
            incident_date: self.incident_date,
            incident_location: self.incident_location,
            estimate: self.estimate,
        }
    }
}

/// Builder for [`BillablePolicy`]
pub struct BillablePolicyBuilder {
    policy_id: PolicyId,
    policy_number: String,
    policy_type: String,
    premium: Money,
    withholding_rate: Option<Rate>,
}

impl Default for BillablePolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillablePolicyBuilder {
    pub fn new() -> Self {
        Self {
            policy_id: PolicyId::new(),
            policy_number: "POL-2026-0001".to_string(),
            policy_type: "equipment".to_string(),
            premium: MoneyFixtures::usd_premium(),
            withholding_rate: None,
        }
    }

    pub fn with_policy_type(mut self, policy_type: impl Into<String>) -> Self {
        self.policy_type = policy_type.into();
        self
    }

    pub fn with_premium(mut self, premium: Money) -> Self {
        self.premium = premium;
        self
    }

    pub fn with_withholding(mut self, rate: Rate) -> Self {
        self.withholding_rate = Some(rate);
        self
    }

    pub fn build(self) -> BillablePolicy {
        BillablePolicy {
            policy_id: self.policy_id,
            policy_number: self.policy_number,
            policy_type: self.policy_type,
            premium: self.premium,
            withholding_rate: self.withholding_rate,
        }
    }
}

/// Claims service over in-memory adapters, with handles to inspect them
///
/// The store starts out knowing one policy, [`policy_id`](Self::policy_id),
/// so claims built with [`new_claim`](Self::new_claim) can be reported
/// straight away.
#[derive(Clone)]
pub struct ClaimsHarness {
    pub service: ClaimWorkflowService,
    pub store: Arc<InMemoryClaimStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub audit: Arc<MemoryAuditSink>,
    pub policy_id: PolicyId,
}

impl ClaimsHarness {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new())
    }

    /// # Arguments
    ///
    /// * `notifier` - Notifier to hand the service, e.g. a failing one
    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        let policy_id = PolicyId::new();
        let store = Arc::new(InMemoryClaimStore::with_policies([policy_id]));
        let notifier = Arc::new(notifier);
        let audit = Arc::new(MemoryAuditSink::new());
        let service = ClaimWorkflowService::new(store.clone(), notifier.clone(), audit.clone());
        Self { service, store, notifier, audit, policy_id }
    }

    /// Claim builder already pointing at the harness policy
    pub fn new_claim(&self) -> NewClaimBuilder {
        NewClaimBuilder::new().with_policy_id(self.policy_id)
    }
}

impl Default for ClaimsHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Invoice service over in-memory adapters
#[derive(Clone)]
pub struct BillingHarness {
    pub service: InvoiceService,
    pub store: Arc<InMemoryBillingStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub audit: Arc<MemoryAuditSink>,
}

impl BillingHarness {
    pub fn new(settings: BillingSettings) -> Self {
        let store = Arc::new(InMemoryBillingStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let service = InvoiceService::new(store.clone(), notifier.clone(), audit.clone(), settings);
        Self { service, store, notifier, audit }
    }

    /// Registers a policy and returns it
    pub async fn with_policy(&self, policy: BillablePolicy) -> BillablePolicy {
        self.store.add_policy(policy.clone()).await;
        policy
    }
}

impl Default for BillingHarness {
    fn default() -> Self {
        Self::new(BillingSettings::default())
    }
}
