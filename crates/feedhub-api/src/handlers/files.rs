//! Extracted package members.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::extractors::ApiKey;
use crate::state::AppState;

/// GET /files/{*path}
pub async fn get_file(
    State(state): State<AppState>,
    key: ApiKey,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    key.require_read(&state).await?;
    let file = state.backend.get_file(&path).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, file.content_type)],
        file.data,
    )
        .into_response())
}
