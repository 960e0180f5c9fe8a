//! Package archive downloads.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::info;

use feedhub_core::error::AppError;
use feedhub_entity::package::record::package_filename;
use feedhub_protocol::{function_segment, media, parse_function_params};

use crate::error::ApiError;
use crate::extractors::ApiKey;
use crate::state::AppState;

/// GET /nupkg/{id}/{version}
pub async fn download_package(
    State(state): State<AppState>,
    key: ApiKey,
    Path((id, version)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    key.require_read(&state).await?;
    serve_package(&state, &id, &version).await
}

/// GET /{segment}/$value
pub async fn download_value(
    State(state): State<AppState>,
    key: ApiKey,
    Path(segment): Path<String>,
) -> Result<Response, ApiError> {
    key.require_read(&state).await?;
    let params = parse_function_params(function_segment(&segment));
    if !segment.starts_with("Packages(") || !params.is_entry() {
        return Err(AppError::not_found(format!("No package named by {segment}")).into());
    }
    serve_package(&state, &params.id, &params.version).await
}

async fn serve_package(state: &AppState, id: &str, version: &str) -> Result<Response, ApiError> {
    let file = state.backend.get_package_file(id, version).await?;
    info!(id, version, bytes = file.data.len(), "Serving package");

    Ok((
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "max-age=3600".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("filename={}", package_filename(id, version)),
            ),
            (header::CONTENT_TYPE, media::PACKAGE.to_string()),
        ],
        file.data,
    )
        .into_response())
}
