//! FeedHub Server: a NuGet V2 package feed.
//!
//! Main entry point that wires all crates together and starts the server.

use tracing_subscriber::{EnvFilter, fmt};

use feedhub_core::config::AppConfig;
use feedhub_core::config::auth::AuthConfig;
use feedhub_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("FEEDHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting FeedHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Initialize storage backend ───────────────────────
    tracing::info!(
        "Initializing storage (backend: {}, keys: {})...",
        config.storage.backend,
        config.auth.key_source
    );
    let backend = feedhub_storage::build_backend(&config).await?;
    tracing::info!("Storage backend '{}' initialized", backend.backend_type());

    // ── Step 2: Key mode warnings ────────────────────────────────
    if config.auth.key_source == "config" {
        warn_key_mode(&config.auth);
    }

    // ── Step 3: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Feed base URL: {}", config.server.base_url());

    let state = feedhub_api::AppState::new(config, backend);
    let app = feedhub_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("FeedHub server listening on {}", addr);

    // ── Step 4: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("FeedHub server shut down gracefully");
    Ok(())
}

/// Warn when the configured keys leave the feed open.
fn warn_key_mode(auth: &AuthConfig) {
    let policy = feedhub_auth::AccessPolicy::from_config(auth);
    match policy.mode() {
        feedhub_auth::PolicyMode::Open => {
            tracing::warn!("No API Keys defined, server running in development mode");
            tracing::warn!("Anyone can read or write to the server");
        }
        feedhub_auth::PolicyMode::PublicRead => {
            tracing::warn!("No read-only API Keys defined, anyone can read");
        }
        feedhub_auth::PolicyMode::Restricted => {}
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
