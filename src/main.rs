//! Loanbook backend server
//!
//! Serves the loan-management API on top of a synced remote document store:
//! clients, loans, payments, analytics, collections, and a WebSocket feed of
//! document snapshots.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use loanbook_server::cache::LocalCache;
use loanbook_server::config::{Config, StoreBackend};
use loanbook_server::domain::DomainService;
use loanbook_server::handlers;
use loanbook_server::middleware;
use loanbook_server::routes;
use loanbook_server::state::AppState;
use loanbook_server::store::{GistStore, MemoryStore, RemoteStore, SupabaseStore};
use loanbook_server::sync::SyncEngine;
use loanbook_server::ws;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        backend = config.store_backend.as_str(),
        "Starting loanbook server"
    );

    // Pick the remote store backend
    let store: Arc<dyn RemoteStore> = match config.store_backend {
        StoreBackend::Gist => {
            let gist_id = config.gist_id.clone().unwrap_or_default();
            tracing::info!(gist_id = %gist_id, token = %config.gist_token_masked(), "Using gist store");
            Arc::new(GistStore::new(gist_id, config.gist_token.clone()))
        }
        StoreBackend::Supabase => Arc::new(SupabaseStore::new(
            config.supabase_url.clone(),
            config.supabase_key.clone(),
        )),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let cache = LocalCache::new(config.cache_path.clone(), config.payments_path.clone());

    // Sync engine: initial load, then background refresh
    let sync = Arc::new(SyncEngine::new(store, cache.clone()));
    sync.init().await;

    let refresh_interval = Duration::from_secs(config.sync_interval_secs);
    tokio::spawn(sync.clone().run(refresh_interval));

    // Domain service over the synced document
    let domain = Arc::new(DomainService::new(sync.clone(), cache));
    domain.init().await;

    let app_state = AppState::new(domain, sync, config.pix_key.clone());

    // Create the app router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health))
        .route("/ws", get(ws::ws_handler))
        .merge(routes::client_routes())
        .merge(routes::loan_routes())
        .merge(routes::payment_routes())
        .merge(routes::analytics_routes())
        .merge(routes::collections_routes())
        .merge(routes::sync_routes())
        .merge(routes::document_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket available at ws://{}/ws", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Serve with graceful shutdown
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

async fn root() -> &'static str {
    "Loanbook API Server"
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins_str = allowed_origins.unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
