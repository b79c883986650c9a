//! FieldHub API
//!
//! REST service for the FieldHub collaboration backend.
//!
//! ## Endpoints
//!
//! - `GET  /api/v1/plans` - List public plans
//! - `GET  /api/v1/admin/plans` - Plan summary listing
//! - `GET  /api/v1/admin/package-types` - Package type summary listing
//! - `POST /api/v1/accounts` - Create account
//! - `GET  /api/v1/accounts/{username}` - Get account
//! - `PUT  /api/v1/accounts/{username}/storage-usage` - Record storage usage
//! - `POST /api/v1/organizations/{username}/members` - Add organization member
//! - `GET  /api/v1/organizations/{username}/members` - List organization members
//! - `POST /api/v1/projects` - Create project
//! - `GET  /api/v1/projects` - List projects by owner
//! - `POST /api/v1/projects/{id}/collaborators` - Add collaborator
//! - `GET  /api/v1/projects/{id}/collaborators` - List collaborators
//! - `GET  /api/v1/billing/subscription` - Get (or lazily create) the active subscription
//! - `GET  /api/v1/billing/subscriptions` - Subscription history
//! - `POST /api/v1/billing/subscription/default` - Activate the default plan
//! - `PUT  /api/v1/billing/packages/storage` - Set storage package quantity
//! - `GET  /api/v1/billing/packages` - List package records
//! - `GET  /api/v1/billing/storage` - Storage entitlement and usage
//! - `POST /webhooks/payment` - Payment provider webhook
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;

use axum::routing::{get, post, put};
use axum::Router;
use fieldhub_billing_core::SubscriptionLedger;
use fieldhub_db::pg::Repositories;
use fieldhub_db::{PackageTypeRepository, PlanRepository};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("fieldhub_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FieldHub API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool and apply migrations
    let pool = fieldhub_db::create_pool(&config.database_url).await?;
    fieldhub_db::run_migrations(&pool).await?;
    tracing::info!("Database pool created");

    // Create repositories and seed billing defaults
    let repos = Repositories::new(pool.clone());
    repos
        .plans
        .ensure_defaults(
            &config.ledger.default_person_plan_code,
            &config.ledger.default_organization_plan_code,
        )
        .await?;
    repos.package_types.get_or_create_storage().await?;
    tracing::info!("Billing defaults ensured");

    // Create the subscription ledger
    let ledger = SubscriptionLedger::new(repos.clone(), config.ledger.clone());

    // Create application state
    let state = AppState::new(ledger, repos, pool, config.clone());

    // Build HTTP router
    let app = build_router(state, metrics_handle);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    run_http_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 routes
    let api_v1 = Router::new()
        // Plan routes
        .route("/plans", get(handlers::list_plans))
        .route("/admin/plans", get(handlers::list_plans_admin))
        .route(
            "/admin/package-types",
            get(handlers::list_package_types_admin),
        )
        // Account routes
        .route("/accounts", post(handlers::create_account))
        .route("/accounts/{username}", get(handlers::get_account))
        .route(
            "/accounts/{username}/storage-usage",
            put(handlers::set_storage_usage),
        )
        // Organization routes
        .route(
            "/organizations/{username}/members",
            post(handlers::add_member).get(handlers::list_members),
        )
        // Project routes
        .route(
            "/projects",
            post(handlers::create_project).get(handlers::list_projects),
        )
        .route(
            "/projects/{id}/collaborators",
            post(handlers::add_collaborator).get(handlers::list_collaborators),
        )
        // Billing routes
        .route("/billing/subscription", get(handlers::get_subscription))
        .route("/billing/subscriptions", get(handlers::list_subscriptions))
        .route(
            "/billing/subscription/default",
            post(handlers::create_default_subscription),
        )
        .route(
            "/billing/packages/storage",
            put(handlers::set_storage_package),
        )
        .route("/billing/packages", get(handlers::list_packages))
        .route("/billing/storage", get(handlers::get_storage));

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes = Router::new().route("/webhooks/payment", post(handlers::payment_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most ledger operations should complete in <100ms, SLO at <200ms p99
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("billing_operation_duration_seconds".to_string()),
            latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!(
        "billing_subscriptions_activated_total",
        "Total default subscriptions activated"
    );
    metrics::describe_counter!(
        "billing_packages_changed_total",
        "Total package quantity changes by kind"
    );
    metrics::describe_counter!(
        "billing_webhooks_processed_total",
        "Total webhooks processed by status"
    );
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency in seconds"
    );
    metrics::describe_histogram!(
        "billing_operation_duration_seconds",
        "Ledger operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
