//! On-demand index rebuild.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};
use tracing::info;

use crate::error::ApiError;
use crate::extractors::ApiKey;
use crate::state::AppState;

/// GET /Refresh
pub async fn refresh(State(state): State<AppState>, key: ApiKey) -> Result<Json<Value>, ApiError> {
    key.require_write(&state).await?;
    let packages = state.backend.refresh().await?;
    info!(packages, backend = state.backend.backend_type(), "Refreshed package index");
    Ok(Json(json!({ "status": "ok", "packages": packages })))
}
