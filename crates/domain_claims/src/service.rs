//! Claims workflow service
//!
//! Orchestrates the claim aggregate, the store and the notification and
//! audit collaborators. Every status change goes through
//! [`ClaimWorkflowService::transition_with`].

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde_json::json;
use tracing::{info, instrument, warn};

use core_kernel::{
    dispatch_notification, Actor, AuditRecord, AuditSink, ClaimId, NotificationEvent,
    NotificationKind, NotificationPort, RequestContext, Role, UserId,
};

use crate::claim::{format_claim_number, Claim, NewClaim, TransitionRequest};
use crate::document::{ClaimDocument, NewDocument};
use crate::error::ClaimError;
use crate::ports::ClaimStore;
use crate::timeline::ClaimTimelineEntry;
use crate::workflow::ClaimStatus;

/// Entry point for every claims operation
#[derive(Clone)]
pub struct ClaimWorkflowService {
    store: Arc<dyn ClaimStore>,
    notifier: Arc<dyn NotificationPort>,
    audit: Arc<dyn AuditSink>,
}

impl ClaimWorkflowService {
    pub fn new(
        store: Arc<dyn ClaimStore>,
        notifier: Arc<dyn NotificationPort>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { store, notifier, audit }
    }

    /// Records a new claim in `pending_validation`
    ///
    /// # Arguments
    ///
    /// * `new` - Incident details; `policy_id` must name a known policy
    /// * `actor` - The reporting custodian
    /// * `context` - Request time and client details; the claim number's year
    ///   comes from `context.received_at`
    ///
    /// # Errors
    ///
    /// * `ClaimError::Unauthorized` - `actor` is not a custodian
    /// * `ClaimError::PolicyNotFound` - the policy does not exist
    /// * `ClaimError::Validation` - negative estimate or incident in the future
    #[instrument(skip(self, new, context), fields(user = %actor.user_id))]
    pub async fn report_claim(
        &self,
        new: NewClaim,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Claim, ClaimError> {
        if actor.role != Role::Custodian {
            warn!(role = %actor.role, "Claim report refused");
            return Err(ClaimError::unauthorized("only custodians may report claims"));
        }
        if !self.store.policy_exists(new.policy_id).await? {
            warn!(policy = %new.policy_id, "Claim reported against unknown policy");
            return Err(ClaimError::PolicyNotFound(new.policy_id.to_string()));
        }

        let year = context.received_at.year();
        let sequence = self.store.next_claim_sequence(year).await?;
        let claim = Claim::report(
            new,
            format_claim_number(year, sequence),
            actor.user_id,
            context.received_at,
        )?;
        self.store.insert_claim(&claim).await?;

        info!(claim = %claim.claim_number, estimate = %claim.estimate, "Claim reported");

        self.audit_after_commit(
            AuditRecord::new(
                "create",
                "claim",
                claim.id,
                format!("Claim {} reported", claim.claim_number),
                claim.created_at,
            )
            .by(actor.user_id)
            .with_values(None, serde_json::to_value(&claim).ok())
            .from_client(context.ip_address, context.user_agent.clone()),
        )
        .await;

        self.notify(
            NotificationKind::ClaimReported,
            &claim,
            claim.stakeholders(),
            format!("Claim {} was reported and awaits validation", claim.claim_number),
        );

        Ok(claim)
    }

    /// Moves a claim to `target` with no side data
    pub async fn transition(
        &self,
        claim_id: ClaimId,
        target: ClaimStatus,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Claim, ClaimError> {
        self.transition_with(claim_id, TransitionRequest::to(target), actor, context)
            .await
    }

    /// Moves a claim along one edge of the transition table
    ///
    /// The claim and its timeline entry are committed together; audit and
    /// notification run afterwards and cannot fail the call.
    ///
    /// # Errors
    ///
    /// * `ClaimError::InvalidTransition` - no table edge from the current status
    /// * `ClaimError::Unauthorized` - the edge needs another role, or the
    ///   reporter for a resubmission
    /// * `ClaimError::InvalidSettlement` - settlement outside `[0, estimate]`
    ///   or sent with a target other than `liquidated`
    /// * `ClaimError::ConcurrentModification` - another change landed first
    #[instrument(skip(self, request, context), fields(user = %actor.user_id, target = %request.target))]
    pub async fn transition_with(
        &self,
        claim_id: ClaimId,
        request: TransitionRequest,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.store.load_claim(claim_id).await?;
        let expected_version = claim.version;
        let at = context.received_at.max(claim.updated_at);

        let previous = match claim.apply_transition(&request, actor, at) {
            Ok(previous) => previous,
            Err(e) => {
                if matches!(e, ClaimError::Unauthorized(_)) {
                    warn!(claim = %claim.claim_number, role = %actor.role, "Transition refused");
                }
                return Err(e);
            }
        };
        let entry = ClaimTimelineEntry::record(&claim, previous, actor, context, request.notes.clone());

        self.store
            .save_claim_with_timeline_entry(&claim, &entry, expected_version)
            .await?;

        info!(
            claim = %claim.claim_number,
            from = %previous,
            to = %claim.status,
            version = claim.version,
            "Claim status changed"
        );

        self.audit_after_commit(
            AuditRecord::new(
                "status_change",
                "claim",
                claim.id,
                format!("Claim {} moved from {} to {}", claim.claim_number, previous, claim.status),
                entry.changed_at,
            )
            .by(actor.user_id)
            .with_values(
                Some(json!({ "status": previous })),
                Some(json!({
                    "status": claim.status,
                    "settlement": claim.settlement,
                    "rejection_reason": claim.rejection_reason,
                    "notes": entry.notes,
                })),
            )
            .from_client(context.ip_address, context.user_agent.clone()),
        )
        .await;

        self.notify(
            NotificationKind::ClaimStatusChanged,
            &claim,
            claim.stakeholders(),
            format!("Claim {} is now {}", claim.claim_number, claim.status),
        );

        Ok(claim)
    }

    /// Assigns the handling manager
    #[instrument(skip(self, context), fields(user = %actor.user_id))]
    pub async fn assign(
        &self,
        claim_id: ClaimId,
        manager_id: UserId,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<Claim, ClaimError> {
        if !actor.is_manager() {
            return Err(ClaimError::unauthorized("only managers may assign claims"));
        }

        let mut claim = self.store.load_claim(claim_id).await?;
        let expected_version = claim.version;
        let previous = claim.assigned_to;
        claim.assign_to(manager_id, context.received_at)?;
        self.store.update_claim(&claim, expected_version).await?;

        info!(claim = %claim.claim_number, manager = %manager_id, "Claim assigned");

        self.audit_after_commit(
            AuditRecord::new(
                "assign",
                "claim",
                claim.id,
                format!("Claim {} assigned to {}", claim.claim_number, manager_id),
                claim.updated_at,
            )
            .by(actor.user_id)
            .with_values(
                Some(json!({ "assigned_to": previous })),
                Some(json!({ "assigned_to": manager_id })),
            )
            .from_client(context.ip_address, context.user_agent.clone()),
        )
        .await;

        self.notify(
            NotificationKind::ClaimAssigned,
            &claim,
            vec![manager_id],
            format!("Claim {} was assigned to you", claim.claim_number),
        );

        Ok(claim)
    }

    /// Records document metadata against an open claim
    #[instrument(skip(self, new, context), fields(user = %actor.user_id))]
    pub async fn attach_document(
        &self,
        claim_id: ClaimId,
        new: NewDocument,
        actor: &Actor,
        context: &RequestContext,
    ) -> Result<ClaimDocument, ClaimError> {
        let claim = self.store.load_claim(claim_id).await?;
        if claim.status.is_terminal() {
            return Err(ClaimError::ClaimClosed(claim.claim_number));
        }
        if !actor.is_manager() && actor.user_id != claim.reported_by {
            return Err(ClaimError::unauthorized(
                "only the reporting custodian or a manager may attach documents",
            ));
        }

        let document = ClaimDocument::new(claim.id, new, actor.user_id, context.received_at)?;
        self.store.save_document(&document).await?;

        info!(
            claim = %claim.claim_number,
            document = %document.id,
            kind = %document.document_type,
            "Document attached"
        );

        self.audit_after_commit(
            AuditRecord::new(
                "document_upload",
                "claim",
                claim.id,
                format!("Document '{}' attached to {}", document.name, claim.claim_number),
                document.uploaded_at,
            )
            .by(actor.user_id)
            .with_values(None, serde_json::to_value(&document).ok())
            .from_client(context.ip_address, context.user_agent.clone()),
        )
        .await;

        self.notify(
            NotificationKind::ClaimDocumentUploaded,
            &claim,
            claim.stakeholders(),
            format!("Document '{}' was added to claim {}", document.name, claim.claim_number),
        );

        Ok(document)
    }

    pub async fn get_claim(&self, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        Ok(self.store.load_claim(claim_id).await?)
    }

    pub async fn timeline(&self, claim_id: ClaimId) -> Result<Vec<ClaimTimelineEntry>, ClaimError> {
        self.store.load_claim(claim_id).await?;
        Ok(self.store.timeline(claim_id).await?)
    }

    pub async fn documents(&self, claim_id: ClaimId) -> Result<Vec<ClaimDocument>, ClaimError> {
        self.store.load_claim(claim_id).await?;
        Ok(self.store.documents(claim_id).await?)
    }

    /// Open claims that have sat in their status past its threshold
    pub async fn overdue_claims(&self, now: DateTime<Utc>) -> Result<Vec<Claim>, ClaimError> {
        let open = self.store.list_open_claims().await?;
        Ok(open.into_iter().filter(|c| c.is_overdue(now)).collect())
    }

    async fn audit_after_commit(&self, record: AuditRecord) {
        let action = record.action.clone();
        let entity_id = record.entity_id.clone();
        if let Err(e) = self.audit.record(record).await {
            warn!(action = %action, entity = %entity_id, error = %e, "Audit hand-off failed");
        }
    }

    fn notify(&self, kind: NotificationKind, claim: &Claim, recipients: Vec<UserId>, message: String) {
        dispatch_notification(
            self.notifier.clone(),
            NotificationEvent::new(kind, &claim.claim_number, recipients, message),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, TimeZone};
    use core_kernel::mock::{MemoryAuditSink, RecordingNotifier};
    use core_kernel::{AssetId, DomainPort, Money, Currency, PolicyId, PortError};
    use rust_decimal_macros::dec;
    use tokio::sync::Barrier;

    use crate::document::DocumentType;
    use crate::ports::mock::InMemoryClaimStore;

    struct Harness {
        service: ClaimWorkflowService,
        store: Arc<InMemoryClaimStore>,
        notifier: Arc<RecordingNotifier>,
        audit: Arc<MemoryAuditSink>,
        policy_id: PolicyId,
        custodian: Actor,
        manager: Actor,
    }

    fn harness_with(notifier: RecordingNotifier) -> Harness {
        let policy_id = PolicyId::new();
        let store = Arc::new(InMemoryClaimStore::with_policies([policy_id]));
        let notifier = Arc::new(notifier);
        let audit = Arc::new(MemoryAuditSink::new());
        Harness {
            service: ClaimWorkflowService::new(store.clone(), notifier.clone(), audit.clone()),
            store,
            notifier,
            audit,
            policy_id,
            custodian: Actor::custodian(UserId::new()),
            manager: Actor::manager(UserId::new()),
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingNotifier::new())
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 6, 8, 30, 0).unwrap()
    }

    fn ctx(hours: i64) -> RequestContext {
        RequestContext::at(start() + Duration::hours(hours))
            .with_ip("192.168.10.4".parse().unwrap())
            .with_user_agent("campus-portal/1.0")
    }

    fn new_claim(policy_id: PolicyId) -> NewClaim {
        NewClaim {
            policy_id,
            asset_id: AssetId::new(),
            description: "Laptop stolen from lab 3".to_string(),
            incident_date: NaiveDate::from_ymd_opt(2026, 4, 5).unwrap(),
            incident_location: Some("Engineering lab 3".to_string()),
            estimate: Money::new(dec!(1200.00), Currency::USD),
        }
    }

    async fn reported(h: &Harness) -> Claim {
        h.service.report_claim(new_claim(h.policy_id), &h.custodian, &ctx(0)).await.unwrap()
    }

    #[tokio::test]
    async fn test_report_assigns_sequential_numbers() {
        let h = harness();
        let first = reported(&h).await;
        let second = reported(&h).await;

        assert_eq!(first.claim_number, "SIN-2026-000001");
        assert_eq!(second.claim_number, "SIN-2026-000002");
        assert_eq!(first.status, ClaimStatus::PendingValidation);

        let events = h.notifier.wait_for(2).await;
        assert!(events.iter().all(|e| e.kind == NotificationKind::ClaimReported));
    }

    #[tokio::test]
    async fn test_manager_cannot_report() {
        let h = harness();
        let result = h.service.report_claim(new_claim(h.policy_id), &h.manager, &ctx(0)).await;
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_report_against_unknown_policy() {
        let h = harness();
        let result = h
            .service
            .report_claim(new_claim(PolicyId::new()), &h.custodian, &ctx(0))
            .await;
        assert!(matches!(result, Err(ClaimError::PolicyNotFound(_))));
        assert!(h.store.list_open_claims().await.unwrap().is_empty());
        assert!(h.audit.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_transition_appends_one_timeline_entry() {
        let h = harness();
        let claim = reported(&h).await;

        let updated = h
            .service
            .transition(claim.id, ClaimStatus::InReview, &h.manager, &ctx(1))
            .await
            .unwrap();
        assert_eq!(updated.status, ClaimStatus::InReview);
        assert_eq!(updated.version, 2);

        let timeline = h.service.timeline(claim.id).await.unwrap();
        assert_eq!(timeline.len(), 1);
        let entry = &timeline[0];
        assert_eq!(entry.previous_status, ClaimStatus::PendingValidation);
        assert_eq!(entry.new_status, ClaimStatus::InReview);
        assert_eq!(entry.changed_by, h.manager.user_id);
        assert_eq!(entry.actor_role, Role::Manager);
        assert_eq!(entry.ip_address, Some("192.168.10.4".parse().unwrap()));
        assert_eq!(entry.user_agent.as_deref(), Some("campus-portal/1.0"));

        let records = h.audit.records().await;
        assert!(records.iter().any(|r| r.action == "status_change"));
    }

    #[tokio::test]
    async fn test_custodian_cannot_approve() {
        let h = harness();
        let claim = reported(&h).await;
        h.service
            .transition(claim.id, ClaimStatus::InReview, &h.manager, &ctx(1))
            .await
            .unwrap();

        let result = h
            .service
            .transition(claim.id, ClaimStatus::Approved, &h.custodian, &ctx(2))
            .await;
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
        assert_eq!(h.service.timeline(claim.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_paid_claim_accepts_no_transition() {
        let h = harness();
        let claim = reported(&h).await;
        for (i, status) in [
            ClaimStatus::InReview,
            ClaimStatus::Approved,
            ClaimStatus::Liquidated,
            ClaimStatus::Paid,
        ]
        .into_iter()
        .enumerate()
        {
            h.service
                .transition(claim.id, status, &h.manager, &ctx(i as i64 + 1))
                .await
                .unwrap();
        }

        for target in ClaimStatus::ALL {
            for actor in [&h.manager, &h.custodian] {
                let result = h.service.transition(claim.id, target, actor, &ctx(10)).await;
                assert!(
                    matches!(result, Err(ClaimError::InvalidTransition { from: ClaimStatus::Paid, .. })),
                    "paid -> {} by {} was not an invalid transition",
                    target,
                    actor.role
                );
            }
        }
    }

    #[tokio::test]
    async fn test_only_reporter_can_resubmit() {
        let h = harness();
        let claim = reported(&h).await;
        h.service
            .transition(claim.id, ClaimStatus::InReview, &h.manager, &ctx(1))
            .await
            .unwrap();
        h.service
            .transition_with(
                claim.id,
                TransitionRequest::to(ClaimStatus::RequiresChanges).with_notes("Need police report"),
                &h.manager,
                &ctx(2),
            )
            .await
            .unwrap();

        let other = Actor::custodian(UserId::new());
        let refused = h
            .service
            .transition(claim.id, ClaimStatus::PendingValidation, &other, &ctx(3))
            .await;
        assert!(matches!(refused, Err(ClaimError::Unauthorized(_))));

        let by_manager = h
            .service
            .transition(claim.id, ClaimStatus::PendingValidation, &h.manager, &ctx(3))
            .await;
        assert!(matches!(by_manager, Err(ClaimError::Unauthorized(_))));

        let resubmitted = h
            .service
            .transition(claim.id, ClaimStatus::PendingValidation, &h.custodian, &ctx(3))
            .await
            .unwrap();
        assert_eq!(resubmitted.status, ClaimStatus::PendingValidation);

        let timeline = h.service.timeline(claim.id).await.unwrap();
        assert_eq!(timeline[1].notes.as_deref(), Some("Need police report"));
    }

    #[tokio::test]
    async fn test_missing_claim() {
        let h = harness();
        let result = h
            .service
            .transition(ClaimId::new(), ClaimStatus::InReview, &h.manager, &ctx(1))
            .await;
        assert!(matches!(result, Err(ClaimError::ClaimNotFound(_))));
    }

    #[tokio::test]
    async fn test_timeline_timestamps_never_decrease() {
        let h = harness();
        let claim = reported(&h).await;
        h.service
            .transition(claim.id, ClaimStatus::InReview, &h.manager, &ctx(5))
            .await
            .unwrap();
        // request clock behind the last update
        h.service
            .transition(claim.id, ClaimStatus::Approved, &h.manager, &ctx(2))
            .await
            .unwrap();

        let timeline = h.service.timeline(claim.id).await.unwrap();
        assert_eq!(timeline.len(), 2);
        assert!(timeline[1].changed_at >= timeline[0].changed_at);
        assert_eq!(timeline[1].changed_at, start() + Duration::hours(5));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_undo_transition() {
        let h = harness_with(RecordingNotifier::failing());
        let claim = reported(&h).await;

        let updated = h
            .service
            .transition(claim.id, ClaimStatus::InReview, &h.manager, &ctx(1))
            .await
            .unwrap();
        assert_eq!(updated.status, ClaimStatus::InReview);

        let events = h.notifier.wait_for(2).await;
        assert!(events.iter().any(|e| e.kind == NotificationKind::ClaimStatusChanged));
        assert_eq!(h.store.load_claim(claim.id).await.unwrap().status, ClaimStatus::InReview);
    }

    #[tokio::test]
    async fn test_assignment_notifies_manager() {
        let h = harness();
        let claim = reported(&h).await;
        let handler = UserId::new();

        let assigned = h.service.assign(claim.id, handler, &h.manager, &ctx(1)).await.unwrap();
        assert_eq!(assigned.assigned_to, Some(handler));

        let refused = h.service.assign(claim.id, handler, &h.custodian, &ctx(1)).await;
        assert!(matches!(refused, Err(ClaimError::Unauthorized(_))));

        let events = h.notifier.wait_for(2).await;
        let assigned_event = events
            .iter()
            .find(|e| e.kind == NotificationKind::ClaimAssigned)
            .unwrap();
        assert_eq!(assigned_event.recipients, vec![handler]);
    }

    #[tokio::test]
    async fn test_documents_only_on_open_claims() {
        let h = harness();
        let claim = reported(&h).await;
        let doc = NewDocument {
            name: "police-report.pdf".to_string(),
            document_type: DocumentType::PoliceReport,
            storage_key: "claims/SIN-2026-000001/police-report.pdf".to_string(),
            size_bytes: 48_213,
            required: true,
        };

        let stranger = Actor::custodian(UserId::new());
        let refused = h.service.attach_document(claim.id, doc.clone(), &stranger, &ctx(1)).await;
        assert!(matches!(refused, Err(ClaimError::Unauthorized(_))));

        h.service
            .attach_document(claim.id, doc.clone(), &h.custodian, &ctx(1))
            .await
            .unwrap();
        assert_eq!(h.service.documents(claim.id).await.unwrap().len(), 1);

        h.service
            .transition(claim.id, ClaimStatus::Rejected, &h.manager, &ctx(2))
            .await
            .unwrap();
        let closed = h.service.attach_document(claim.id, doc, &h.manager, &ctx(3)).await;
        assert!(matches!(closed, Err(ClaimError::ClaimClosed(_))));
    }

    #[tokio::test]
    async fn test_overdue_claims() {
        let h = harness();
        let claim = reported(&h).await;
        h.service
            .transition(claim.id, ClaimStatus::InReview, &h.manager, &ctx(1))
            .await
            .unwrap();
        reported(&h).await;

        let entered = start() + Duration::hours(1);
        assert!(h.service.overdue_claims(entered + Duration::days(30)).await.unwrap().is_empty());

        let overdue = h.service.overdue_claims(entered + Duration::days(31)).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, claim.id);
    }

    /// Holds every load until two callers have read the claim
    struct RacingStore {
        inner: Arc<InMemoryClaimStore>,
        barrier: Barrier,
    }

    impl DomainPort for RacingStore {}

    #[async_trait]
    impl ClaimStore for RacingStore {
        async fn policy_exists(&self, policy_id: PolicyId) -> Result<bool, PortError> {
            self.inner.policy_exists(policy_id).await
        }
        async fn load_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
            let claim = self.inner.load_claim(id).await;
            self.barrier.wait().await;
            claim
        }
        async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError> {
            self.inner.insert_claim(claim).await
        }
        async fn save_claim_with_timeline_entry(
            &self,
            claim: &Claim,
            entry: &ClaimTimelineEntry,
            expected_version: i64,
        ) -> Result<(), PortError> {
            self.inner.save_claim_with_timeline_entry(claim, entry, expected_version).await
        }
        async fn update_claim(&self, claim: &Claim, expected_version: i64) -> Result<(), PortError> {
            self.inner.update_claim(claim, expected_version).await
        }
        async fn timeline(&self, claim_id: ClaimId) -> Result<Vec<ClaimTimelineEntry>, PortError> {
            self.inner.timeline(claim_id).await
        }
        async fn save_document(&self, document: &ClaimDocument) -> Result<(), PortError> {
            self.inner.save_document(document).await
        }
        async fn documents(&self, claim_id: ClaimId) -> Result<Vec<ClaimDocument>, PortError> {
            self.inner.documents(claim_id).await
        }
        async fn next_claim_sequence(&self, year: i32) -> Result<u32, PortError> {
            self.inner.next_claim_sequence(year).await
        }
        async fn list_open_claims(&self) -> Result<Vec<Claim>, PortError> {
            self.inner.list_open_claims().await
        }
    }

    #[tokio::test]
    async fn test_racing_transitions_one_wins() {
        let policy_id = PolicyId::new();
        let inner = Arc::new(InMemoryClaimStore::with_policies([policy_id]));
        let store = Arc::new(RacingStore { inner: inner.clone(), barrier: Barrier::new(2) });
        let service = ClaimWorkflowService::new(
            store,
            Arc::new(RecordingNotifier::new()),
            Arc::new(MemoryAuditSink::new()),
        );

        let custodian = Actor::custodian(UserId::new());
        let claim = service.report_claim(new_claim(policy_id), &custodian, &ctx(0)).await.unwrap();
        let first = Actor::manager(UserId::new());
        let second = Actor::manager(UserId::new());

        let (ctx_a, ctx_b) = (ctx(1), ctx(1));
        let (a, b) = tokio::join!(
            service.transition(claim.id, ClaimStatus::InReview, &first, &ctx_a),
            service.transition(claim.id, ClaimStatus::Rejected, &second, &ctx_b),
        );

        let outcomes = [&a, &b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(ClaimError::ConcurrentModification(_))))
                .count(),
            1
        );

        let stored = inner.load_claim(claim.id).await.unwrap();
        assert!(matches!(stored.status, ClaimStatus::InReview | ClaimStatus::Rejected));
        assert_eq!(inner.timeline(claim.id).await.unwrap().len(), 1);
    }
}
