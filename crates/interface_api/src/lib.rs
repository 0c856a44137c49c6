//! HTTP API Layer
//!
//! This crate provides the REST API for the campus insurance system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for claims, invoices and health
//! - **Middleware**: JWT authentication, request context capture, access log
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Domain errors mapped to consistent JSON responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(claims, invoices, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifier;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_billing::InvoiceService;
use domain_claims::ClaimWorkflowService;

use crate::config::ApiConfig;
use crate::handlers::{claims, health, invoices};
use crate::middleware::{access_log_middleware, auth_middleware, request_context_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub claims: ClaimWorkflowService,
    pub invoices: InvoiceService,
    pub config: ApiConfig,
    /// Adapters probed by `/health/ready`
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
}

impl AppState {
    pub fn new(claims: ClaimWorkflowService, invoices: InvoiceService, config: ApiConfig) -> Self {
        Self {
            claims,
            invoices,
            config,
            health_checks: Vec::new(),
        }
    }

    pub fn with_health_check(mut self, adapter: Arc<dyn HealthCheckable>) -> Self {
        self.health_checks.push(adapter);
        self
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claims_routes = Router::new()
        .route("/", post(claims::report_claim))
        .route("/overdue", get(claims::list_overdue))
        .route("/:id", get(claims::get_claim))
        .route("/:id/transitions", post(claims::transition_claim))
        .route("/:id/timeline", get(claims::get_timeline))
        .route("/:id/documents", post(claims::attach_document).get(claims::list_documents))
        .route("/:id/assignee", put(claims::assign_claim));

    let policy_routes = Router::new().route("/:id/invoices", post(invoices::generate_invoice));

    let invoice_routes = Router::new()
        .route("/:id", get(invoices::get_invoice))
        .route("/:id/payment", post(invoices::record_payment))
        .route("/:id/overdue", post(invoices::mark_overdue))
        .route("/:id/cancel", post(invoices::cancel_invoice));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .nest("/policies", policy_routes)
        .nest("/invoices", invoice_routes)
        .layer(axum_middleware::from_fn(access_log_middleware))
        .layer(axum_middleware::from_fn(request_context_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
