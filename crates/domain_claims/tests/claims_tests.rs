//! End-to-end tests for the claims workflow over the in-memory store

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::mock::RecordingNotifier;
use core_kernel::{Currency, Money, PolicyId, RequestContext};

use domain_claims::workflow::authorize_transition;
use domain_claims::{
    ClaimError, ClaimStatus, NewClaim, RequiredRole, TransitionRequest, TRANSITIONS,
};

use test_utils::{
    actor_strategy, assert_money_eq, assert_status_path, assert_timeline_chain,
    claim_status_strategy, ActorFixtures, ClaimsHarness, MoneyFixtures,
};

fn context(day: i64) -> RequestContext {
    RequestContext::at(Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap() + Duration::days(day))
}

fn damaged_microscope(h: &ClaimsHarness) -> NewClaim {
    h.new_claim()
        .with_description("Microscope lens cracked during transport")
        .with_incident_date(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap())
        .with_estimate(Money::new(dec!(3400.00), Currency::USD))
        .build()
}

mod reporting {
    use super::*;

    #[tokio::test]
    async fn test_unknown_policy_is_refused() {
        let h = ClaimsHarness::new();
        let new = h.new_claim().with_policy_id(PolicyId::new()).build();

        let result = h.service.report_claim(new, &ActorFixtures::custodian(), &context(0)).await;
        assert!(matches!(result, Err(ClaimError::PolicyNotFound(_))));
        assert!(h.audit.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_notifier_does_not_undo_report() {
        let h = ClaimsHarness::with_notifier(RecordingNotifier::failing());
        let context = ActorFixtures::context();

        let claim = h
            .service
            .report_claim(h.new_claim().build(), &ActorFixtures::custodian(), &context)
            .await
            .unwrap();
        assert_money_eq(&claim.estimate, MoneyFixtures::usd_estimate().amount());
        assert_eq!(claim.created_at, context.received_at);

        assert_eq!(h.notifier.wait_for(1).await.len(), 1);
        assert_eq!(h.service.get_claim(claim.id).await.unwrap().id, claim.id);

        let records = h.audit.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ip_address, context.ip_address);
    }

    #[tokio::test]
    async fn test_estimate_in_other_currency_is_kept() {
        let h = ClaimsHarness::new();
        let new = h.new_claim().with_estimate(MoneyFixtures::cop_estimate()).build();

        let claim = h
            .service
            .report_claim(new, &ActorFixtures::custodian(), &context(0))
            .await
            .unwrap();
        assert_eq!(claim.estimate.currency(), Currency::COP);
        assert!(claim.settlement.is_none());
    }

    #[tokio::test]
    async fn test_zero_estimate_is_accepted() {
        let h = ClaimsHarness::new();
        let new = h.new_claim().with_estimate(MoneyFixtures::usd_zero()).build();
        let custodian = ActorFixtures::custodian();
        let manager = ActorFixtures::manager();

        let claim = h.service.report_claim(new, &custodian, &context(0)).await.unwrap();
        h.service.transition(claim.id, ClaimStatus::InReview, &manager, &context(1)).await.unwrap();
        h.service.transition(claim.id, ClaimStatus::Approved, &manager, &context(2)).await.unwrap();
        let liquidated = h
            .service
            .transition(claim.id, ClaimStatus::Liquidated, &manager, &context(3))
            .await
            .unwrap();

        let settlement = liquidated.settlement.unwrap();
        assert!(settlement.is_zero(), "expected zero settlement, got {}", settlement);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_happy_path_to_paid() {
        let h = ClaimsHarness::new();
        let custodian = ActorFixtures::custodian();
        let manager = ActorFixtures::manager();

        let claim = h
            .service
            .report_claim(damaged_microscope(&h), &custodian, &context(0))
            .await
            .unwrap();

        h.service.transition(claim.id, ClaimStatus::InReview, &manager, &context(1)).await.unwrap();
        h.service.transition(claim.id, ClaimStatus::Approved, &manager, &context(2)).await.unwrap();
        let liquidated = h
            .service
            .transition_with(
                claim.id,
                TransitionRequest::to(ClaimStatus::Liquidated)
                    .with_settlement(Money::new(dec!(2950.50), Currency::USD))
                    .with_notes("Depreciation applied"),
                &manager,
                &context(3),
            )
            .await
            .unwrap();
        assert_money_eq(&liquidated.settlement.unwrap(), dec!(2950.50));

        let paid = h
            .service
            .transition(claim.id, ClaimStatus::Paid, &manager, &context(4))
            .await
            .unwrap();
        assert_eq!(paid.status, ClaimStatus::Paid);
        assert_eq!(paid.payment_date, Some(context(4).received_at.date_naive()));
        assert_money_eq(&paid.settlement.unwrap(), dec!(2950.50));

        let timeline = h.service.timeline(claim.id).await.unwrap();
        assert_timeline_chain(&timeline);
        assert_status_path(
            &timeline,
            &[
                ClaimStatus::InReview,
                ClaimStatus::Approved,
                ClaimStatus::Liquidated,
                ClaimStatus::Paid,
            ],
        );

        // one create record plus one per transition
        assert_eq!(h.audit.records().await.len(), 5);
    }

    #[tokio::test]
    async fn test_rejection_records_reason() {
        let h = ClaimsHarness::new();
        let claim = h
            .service
            .report_claim(damaged_microscope(&h), &ActorFixtures::custodian(), &context(0))
            .await
            .unwrap();

        let rejected = h
            .service
            .transition_with(
                claim.id,
                TransitionRequest::to(ClaimStatus::Rejected).with_reason("Asset not covered by policy"),
                &ActorFixtures::manager(),
                &context(1),
            )
            .await
            .unwrap();

        assert_eq!(rejected.rejection_reason.as_deref(), Some("Asset not covered by policy"));
        assert!(h.service.overdue_claims(context(400).received_at).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settlement_outside_liquidation_is_refused() {
        let h = ClaimsHarness::new();
        let claim = h
            .service
            .report_claim(damaged_microscope(&h), &ActorFixtures::custodian(), &context(0))
            .await
            .unwrap();

        let result = h
            .service
            .transition_with(
                claim.id,
                TransitionRequest::to(ClaimStatus::InReview)
                    .with_settlement(Money::new(dec!(1), Currency::USD)),
                &ActorFixtures::manager(),
                &context(1),
            )
            .await;
        assert!(matches!(result, Err(ClaimError::InvalidSettlement(_))));
    }
}

mod authorization {
    use super::*;

    #[test]
    fn test_edge_checked_before_role() {
        let custodian = ActorFixtures::custodian();
        for target in ClaimStatus::ALL {
            let result = authorize_transition(ClaimStatus::Rejected, target, &custodian, custodian.user_id);
            assert!(matches!(result, Err(ClaimError::InvalidTransition { .. })));
        }
    }

    #[test]
    fn test_every_manager_edge_refuses_custodians() {
        let custodian = ActorFixtures::custodian();
        for rule in TRANSITIONS.iter().filter(|r| r.required == RequiredRole::Manager) {
            let result = authorize_transition(rule.from, rule.to, &custodian, custodian.user_id);
            assert!(
                matches!(result, Err(ClaimError::Unauthorized(_))),
                "{} -> {} accepted a custodian",
                rule.from,
                rule.to
            );
        }
    }

    #[test]
    fn test_allowed_targets_from_in_review() {
        let mut targets = ClaimStatus::InReview.allowed_targets();
        targets.sort_by_key(|s| s.as_str());
        assert_eq!(
            targets,
            vec![ClaimStatus::Approved, ClaimStatus::Rejected, ClaimStatus::RequiresChanges]
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Random requests by random actors only ever walk table edges
    #[test]
    fn prop_timeline_only_follows_table_edges(
        steps in proptest::collection::vec((claim_status_strategy(), actor_strategy()), 1..24)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let h = ClaimsHarness::new();
            let reporter = ActorFixtures::custodian();
            let claim = h
                .service
                .report_claim(h.new_claim().build(), &reporter, &context(0))
                .await
                .unwrap();

            for (i, (target, actor)) in steps.iter().enumerate() {
                // generated custodians are strangers; let the reporter act in their place
                let actor = if actor.is_manager() { actor } else { &reporter };
                let _ = h
                    .service
                    .transition_with(claim.id, TransitionRequest::to(*target), actor, &context(i as i64 + 1))
                    .await;
            }

            let timeline = h.service.timeline(claim.id).await.unwrap();
            assert_timeline_chain(&timeline);

            let stored = h.service.get_claim(claim.id).await.unwrap();
            let current = timeline.last().map_or(ClaimStatus::PendingValidation, |e| e.new_status);
            assert_eq!(stored.status, current);
            assert_eq!(stored.version, timeline.len() as i64 + 1);
            assert_eq!(stored.settlement.is_some(), stored.status.is_settled());
        });
    }
}
