//! Package push.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{StatusCode, header};
use bytes::Bytes;
use tracing::{info, warn};

use feedhub_core::error::{AppError, ErrorKind};
use feedhub_storage::StoreOutcome;

use crate::error::ApiError;
use crate::extractors::ApiKey;
use crate::state::AppState;

/// PUT / and PUT /api/v2/package
///
/// The archive travels as a multipart part; with several parts the last one
/// is used. Anything that is not multipart counts as an empty push.
pub async fn upload_package(
    State(state): State<AppState>,
    key: ApiKey,
    request: Request,
) -> Result<StatusCode, ApiError> {
    key.require_write(&state).await?;

    let body = read_package_part(request, &state).await?;
    if body.is_empty() {
        return Ok(StatusCode::NO_CONTENT);
    }

    match state.backend.store_package(body).await {
        Ok(StoreOutcome::Stored(record)) => {
            info!(id = %record.id(), version = %record.version(), "Package pushed");
            Ok(StatusCode::CREATED)
        }
        Ok(StoreOutcome::AlreadyExists) => Ok(StatusCode::CONFLICT),
        Err(e) if matches!(e.kind, ErrorKind::ManifestMissing | ErrorKind::MalformedArchive) => {
            warn!(error = %e, "Rejected unreadable package");
            Ok(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn read_package_part(request: Request, state: &AppState) -> Result<Bytes, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"));
    if !is_multipart {
        return Ok(Bytes::new());
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart body: {e}")))?;

    let mut body = Bytes::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart body: {e}")))?
    {
        body = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read upload: {e}")))?;
    }
    Ok(body)
}
