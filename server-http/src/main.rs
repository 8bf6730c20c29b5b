mod api;
mod cookies;
mod handlers;
mod middleware;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use kv_engine::{Store, StoreConfig};
use parlor::repository::MemoryRepository;
use parlor::session::SessionService;
use shared::config::Config;
use state::AppState;
use tracing::{info, Level};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting Parlor HTTP server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Arc::new(Config::from_env());

    // Session-key cache with its background reaper
    let store = Arc::new(Store::new(StoreConfig {
        cleanup_interval: Duration::from_secs(config.cleanup_interval_secs),
        max_cleanup_batch: config.max_cleanup_batch,
    }));

    let sessions = Arc::new(SessionService::new(
        Arc::clone(&store),
        Duration::from_secs(config.session_ttl_secs),
    ));
    let repository = Arc::new(MemoryRepository::new());

    let state = AppState::new(Arc::clone(&store), sessions, repository, Arc::clone(&config));
    let router = routes::build_router(state);

    let addr = format!("{}:{}", config.host, config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // Stop the cache reaper before exiting so shutdown never races a sweep.
    store.close().await;
    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
