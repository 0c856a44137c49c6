//! Campus Insurance - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin campus-insurance-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `API_CURRENCY` - Currency for claim estimates sent without one (default: USD)
//! * `API_VAT_RATE`, `API_SUPERINTENDENCE_RATE`, `API_RURAL_INSURANCE_RATE`,
//!   `API_EARLY_PAYMENT_DISCOUNT_RATE`, `API_WITHHOLDING_CAP`,
//!   `API_EARLY_PAYMENT_WINDOW_DAYS` - billing defaults

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::Money;
use domain_billing::InvoiceService;
use domain_claims::ClaimWorkflowService;
use infra_db::{
    create_pool, run_migrations, DatabaseConfig, PostgresAuditSink, PostgresBillingStore,
    PostgresClaimStore,
};
use interface_api::{config::ApiConfig, create_router, notifier::LoggingNotifier, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading API_* configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting campus insurance API server"
    );

    let currency = config.default_currency().context("invalid API_CURRENCY")?;
    let settings = config.billing_settings();
    // Fail at startup rather than on the first invoice
    settings
        .rates
        .validate(&Money::zero(currency))
        .context("invalid billing configuration")?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(DatabaseConfig::new(config.database_url.clone())).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let claim_store = Arc::new(PostgresClaimStore::new(pool.clone()));
    let billing_store = Arc::new(PostgresBillingStore::new(pool.clone()));
    let audit = Arc::new(PostgresAuditSink::new(pool));
    let notifier = Arc::new(LoggingNotifier);

    let claims = ClaimWorkflowService::new(claim_store.clone(), notifier.clone(), audit.clone());
    let invoices = InvoiceService::new(billing_store.clone(), notifier, audit.clone(), settings);

    let state = AppState::new(claims, invoices, config.clone())
        .with_health_check(claim_store)
        .with_health_check(billing_store)
        .with_health_check(audit);
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
