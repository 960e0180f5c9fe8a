//! Route definitions for the FeedHub HTTP API.
//!
//! Feed functions (`Packages(...)`, `FindPackagesById()`) share one
//! catch-all segment route and are dispatched by name in the handler,
//! because their parameters live inside the path segment itself.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.storage.max_upload_size_bytes as usize;
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .merge(feed_routes())
        .merge(package_routes())
        .merge(health_routes())
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Service document, metadata and feed functions
fn feed_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::service::service_document).put(handlers::upload::upload_package),
        )
        .route("/$metadata", get(handlers::service::metadata))
        .route("/{segment}", get(handlers::feed::feed))
        .route("/{segment}/$value", get(handlers::download::download_value))
}

/// Push, download, extracted files and index refresh
fn package_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v2/package", put(handlers::upload::upload_package))
        .route("/api/v2/package/", put(handlers::upload::upload_package))
        .route("/nupkg/{id}/{version}", get(handlers::download::download_package))
        .route("/files/{*path}", get(handlers::files::get_file))
        .route("/Refresh", get(handlers::refresh::refresh))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
