//! HTTP tests against the router with in-memory adapters

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use core_kernel::{Actor, ClaimId};
use domain_billing::{BillingSettings, EmissionRightsRule, EmissionRightsSchedule};
use domain_claims::ClaimStatus;
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::dto::claims::{ClaimResponse, TimelineEntryResponse};
use interface_api::dto::invoices::InvoiceResponse;
use interface_api::{create_router, AppState};
use test_utils::{
    assert_status_path, ActorFixtures, BillablePolicyBuilder, BillingHarness, ClaimsHarness,
    TemporalFixtures,
};

struct TestApp {
    router: Router,
    config: ApiConfig,
    claims: ClaimsHarness,
    billing: BillingHarness,
}

fn billing_settings() -> BillingSettings {
    BillingSettings {
        emission_rights: EmissionRightsSchedule::new(vec![EmissionRightsRule::generic(
            dec!(0),
            dec!(5000),
            dec!(10),
        )])
        .unwrap(),
        ..BillingSettings::default()
    }
}

fn app() -> TestApp {
    let config = ApiConfig {
        jwt_secret: "api-test-secret".to_string(),
        ..ApiConfig::default()
    };
    let claims = ClaimsHarness::new();
    let billing = BillingHarness::new(billing_settings());
    let state = AppState::new(claims.service.clone(), billing.service.clone(), config.clone());
    TestApp {
        router: create_router(state),
        config,
        claims,
        billing,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, actor: Option<&Actor>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.7")
            .header(header::USER_AGENT, "api-tests");
        if let Some(actor) = actor {
            let token = create_token(actor, &self.config.jwt_secret, 300).unwrap();
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn claim_body(policy_id: uuid::Uuid) -> Value {
        json!({
            "policy_id": policy_id,
            "asset_id": uuid::Uuid::now_v7(),
            "description": "Projector in lecture hall B fell from its mount",
            "incident_date": "2025-11-03",
            "incident_location": "Building B",
            "estimate": "1500.00"
        })
    }

    async fn report(&self, custodian: &Actor) -> ClaimResponse {
        let body = Self::claim_body(*self.claims.policy_id.as_uuid());
        let (status, body) = self
            .send(Method::POST, "/api/v1/claims", Some(custodian), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        serde_json::from_value(body).unwrap()
    }

    async fn transition(&self, id: uuid::Uuid, actor: &Actor, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, &format!("/api/v1/claims/{}/transitions", id), Some(actor), Some(body))
            .await
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = app();
    let (status, body) = app.send(Method::GET, "/api/v1/claims/overdue", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

mod claims {
    use super::*;

    #[tokio::test]
    async fn test_report_then_review_records_client_details() {
        let app = app();
        let custodian = ActorFixtures::custodian();
        let manager = ActorFixtures::manager();

        let claim = app.report(&custodian).await;
        assert_eq!(claim.status, "pending_validation");
        assert_eq!(claim.claim_number.len(), "SIN-2026-000001".len());
        assert_eq!(claim.currency, "USD");
        assert!(claim.allowed_transitions.contains(&"in_review".to_string()));

        let (status, body) = app
            .transition(claim.id, &manager, json!({"status": "in_review", "notes": "checking photos"}))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["status"], "in_review");
        assert_eq!(body["version"], 2);

        let (status, body) = app
            .send(Method::GET, &format!("/api/v1/claims/{}/timeline", claim.id), Some(&manager), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let entries: Vec<TimelineEntryResponse> = serde_json::from_value(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].previous_status, "pending_validation");
        assert_eq!(entries[0].new_status, "in_review");
        assert_eq!(entries[0].actor_role, "manager");
        assert_eq!(entries[0].ip_address.as_deref(), Some("198.51.100.7"));
        assert_eq!(entries[0].user_agent.as_deref(), Some("api-tests"));
        assert_eq!(entries[0].notes.as_deref(), Some("checking photos"));
    }

    #[tokio::test]
    async fn test_custodian_cannot_approve() {
        let app = app();
        let custodian = ActorFixtures::custodian();
        let claim = app.report(&custodian).await;
        app.transition(claim.id, &ActorFixtures::manager(), json!({"status": "in_review"}))
            .await;

        let (status, body) = app.transition(claim.id, &custodian, json!({"status": "approved"})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");

        let stored = app.claims.service.get_claim(ClaimId::from_uuid(claim.id)).await.unwrap();
        assert_eq!(stored.status, ClaimStatus::InReview);
    }

    #[tokio::test]
    async fn test_skipping_review_is_a_conflict() {
        let app = app();
        let claim = app.report(&ActorFixtures::custodian()).await;

        let (status, body) = app
            .transition(claim.id, &ActorFixtures::manager(), json!({"status": "approved"}))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_unknown_status_is_validation_error() {
        let app = app();
        let claim = app.report(&ActorFixtures::custodian()).await;

        let (status, body) = app
            .transition(claim.id, &ActorFixtures::manager(), json!({"status": "archived"}))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_full_lifecycle_with_partial_settlement() {
        let app = app();
        let manager = ActorFixtures::manager();
        let claim = app.report(&ActorFixtures::custodian()).await;

        for status in ["in_review", "approved"] {
            let (code, body) = app.transition(claim.id, &manager, json!({"status": status})).await;
            assert_eq!(code, StatusCode::OK, "{}", body);
        }
        let (code, body) = app
            .transition(claim.id, &manager, json!({"status": "liquidated", "settlement": "1200.00"}))
            .await;
        assert_eq!(code, StatusCode::OK, "{}", body);
        let liquidated: ClaimResponse = serde_json::from_value(body).unwrap();
        assert_eq!(liquidated.settlement, Some(dec!(1200.00)));

        let (code, body) = app.transition(claim.id, &manager, json!({"status": "paid"})).await;
        assert_eq!(code, StatusCode::OK, "{}", body);
        assert!(body["payment_date"].is_string());

        let entries = app.claims.service.timeline(ClaimId::from_uuid(claim.id)).await.unwrap();
        assert_status_path(
            &entries,
            &[ClaimStatus::InReview, ClaimStatus::Approved, ClaimStatus::Liquidated, ClaimStatus::Paid],
        );
    }

    #[tokio::test]
    async fn test_settlement_above_estimate_rejected() {
        let app = app();
        let manager = ActorFixtures::manager();
        let claim = app.report(&ActorFixtures::custodian()).await;
        app.transition(claim.id, &manager, json!({"status": "in_review"})).await;
        app.transition(claim.id, &manager, json!({"status": "approved"})).await;

        let (code, body) = app
            .transition(claim.id, &manager, json!({"status": "liquidated", "settlement": "1500.01"}))
            .await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    }

    #[tokio::test]
    async fn test_report_against_unknown_policy_is_not_found() {
        let app = app();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/claims",
                Some(&ActorFixtures::custodian()),
                Some(TestApp::claim_body(uuid::Uuid::now_v7())),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_missing_claim_is_not_found() {
        let app = app();
        let uri = format!("/api/v1/claims/{}", uuid::Uuid::now_v7());
        let (status, body) = app.send(Method::GET, &uri, Some(&ActorFixtures::manager()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_documents_round_trip() {
        let app = app();
        let custodian = ActorFixtures::custodian();
        let claim = app.report(&custodian).await;
        let uri = format!("/api/v1/claims/{}/documents", claim.id);

        let (status, body) = app
            .send(
                Method::POST,
                &uri,
                Some(&custodian),
                Some(json!({
                    "name": "mount-photo.jpg",
                    "document_type": "photos",
                    "storage_key": "claims/mount-photo.jpg",
                    "size_bytes": 482133
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        let (status, body) = app.send(Method::GET, &uri, Some(&custodian), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["document_type"], "photos");
    }

    #[tokio::test]
    async fn test_empty_document_rejected_by_validation() {
        let app = app();
        let custodian = ActorFixtures::custodian();
        let claim = app.report(&custodian).await;

        let (status, _) = app
            .send(
                Method::POST,
                &format!("/api/v1/claims/{}/documents", claim.id),
                Some(&custodian),
                Some(json!({
                    "name": "empty.pdf",
                    "document_type": "other",
                    "storage_key": "claims/empty.pdf",
                    "size_bytes": 0
                })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_overdue_listing_is_manager_only() {
        let app = app();
        let (status, _) = app
            .send(Method::GET, "/api/v1/claims/overdue", Some(&ActorFixtures::custodian()), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(Method::GET, "/api/v1/claims/overdue", Some(&ActorFixtures::manager()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}

mod invoices {
    use super::*;

    #[tokio::test]
    async fn test_generate_and_pay_invoice() {
        let app = app();
        let manager = ActorFixtures::manager();
        let policy = app.billing.with_policy(BillablePolicyBuilder::new().build()).await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/policies/{}/invoices", policy.policy_id.as_uuid()),
                Some(&manager),
                Some(json!({
                    "invoice_date": TemporalFixtures::invoice_date(),
                    "due_date": TemporalFixtures::early_due_date()
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let invoice: InvoiceResponse = serde_json::from_value(body).unwrap();
        assert_eq!(invoice.breakdown.subtotal, dec!(1200.00));
        assert_eq!(invoice.breakdown.early_payment_discount, dec!(60.00));
        assert_eq!(invoice.breakdown.total, dec!(1140.00));
        assert_eq!(invoice.breakdown.withholding, Decimal::ZERO);
        assert_eq!(invoice.payment_status, "pending");

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/invoices/{}/payment", invoice.id),
                Some(&manager),
                Some(json!({"payment_date": "2026-04-10"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["payment_status"], "paid");

        let (status, body) = app
            .send(Method::POST, &format!("/api/v1/invoices/{}/cancel", invoice.id), Some(&manager), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    }

    #[tokio::test]
    async fn test_custodian_cannot_invoice() {
        let app = app();
        let policy = app.billing.with_policy(BillablePolicyBuilder::new().build()).await;

        let (status, _) = app
            .send(
                Method::POST,
                &format!("/api/v1/policies/{}/invoices", policy.policy_id.as_uuid()),
                Some(&ActorFixtures::custodian()),
                Some(json!({
                    "invoice_date": TemporalFixtures::invoice_date(),
                    "due_date": TemporalFixtures::late_due_date()
                })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(app.billing.store.invoices().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_policy_is_not_found() {
        let app = app();
        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/policies/{}/invoices", uuid::Uuid::now_v7()),
                Some(&ActorFixtures::manager()),
                Some(json!({
                    "invoice_date": TemporalFixtures::invoice_date(),
                    "due_date": TemporalFixtures::late_due_date()
                })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
    }
}
