//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use feedhub_core::config::AppConfig;
use feedhub_storage::StorageBackend;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Package storage (local or cloud)
    pub backend: Arc<dyn StorageBackend>,
    /// Externally visible base URL, always ending in `/`
    pub base_url: Arc<str>,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Arc<dyn StorageBackend>) -> Self {
        let base_url = Arc::from(config.server.base_url());
        Self {
            config: Arc::new(config),
            backend,
            base_url,
        }
    }
}
