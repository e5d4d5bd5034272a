mod config;
mod db;
mod errors;
mod fiscal_code;
mod handlers;
mod models;
mod reformat;
mod resolver;
mod search_client;
mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::search_client::SearchIndexClient;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Database connection.
/// - The search-index client with a startup connectivity probe.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_fiscal_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Initialize the search-index client and probe connectivity; the service
    // still starts when the index is down so the relational endpoints keep
    // working.
    let search = SearchIndexClient::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize search client: {}", e))?;
    match search.health().await {
        Ok(true) => tracing::info!("✓ Search index reachable: {}", config.search_base_url),
        Ok(false) => tracing::warn!("Search index health probe returned non-success"),
        Err(e) => tracing::warn!("Search index health probe failed: {}", e),
    }

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
        search,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // Entity search (search index)
        .route("/api/v1/entities/search", get(handlers::search_entities))
        .route("/api/v1/entities/autocomplete", get(handlers::autocomplete))
        .route("/api/v1/entities/loan-parties", get(handlers::loan_parties))
        // Fiscal-code lookups (relational collections)
        .route("/api/v1/fiscal-code/:code", get(handlers::get_bundle))
        .route(
            "/api/v1/fiscal-code/:code/validate",
            get(handlers::validate_code),
        )
        .route(
            "/api/v1/fiscal-code/:code/records",
            get(handlers::get_related_records),
        )
        .route(
            "/api/v1/fiscal-code/:code/summary",
            get(handlers::get_summary),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
