//! Service root and `$metadata`.

use axum::extract::State;
use axum::response::Response;

use feedhub_protocol::{METADATA_DOCUMENT, ServiceDocument, media};

use super::xml_response;
use crate::error::ApiError;
use crate::extractors::ApiKey;
use crate::state::AppState;

/// GET /
pub async fn service_document(
    State(state): State<AppState>,
    key: ApiKey,
) -> Result<Response, ApiError> {
    key.require_read(&state).await?;
    let body = ServiceDocument::new(&state.base_url).to_bytes()?;
    Ok(xml_response(media::APPLICATION_XML, body))
}

/// GET /$metadata
pub async fn metadata(State(state): State<AppState>, key: ApiKey) -> Result<Response, ApiError> {
    key.require_read(&state).await?;
    Ok(xml_response(
        media::APPLICATION_XML,
        METADATA_DOCUMENT.as_bytes().to_vec(),
    ))
}
