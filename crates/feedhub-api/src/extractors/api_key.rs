//! `ApiKey` extractor: the caller's key from the configured request header.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use feedhub_auth::AccessLevel;
use feedhub_core::result::AppResult;

use crate::state::AppState;

/// The presented API key. An absent header is the empty key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKey(pub String);

impl ApiKey {
    /// Resolve this key against the backend's access policy.
    pub async fn level(&self, state: &AppState) -> AppResult<AccessLevel> {
        state.backend.get_access_level(&self.0).await
    }

    /// Fail with access denied unless the key may read.
    pub async fn require_read(&self, state: &AppState) -> AppResult<()> {
        self.level(state).await?.require_read()
    }

    /// Fail with access denied unless the key may push.
    pub async fn require_write(&self, state: &AppState) -> AppResult<()> {
        self.level(state).await?.require_write()
    }
}

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Header names match case-insensitively.
        let key = parts
            .headers
            .get(state.config.auth.api_key_header.as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(Self(key))
    }
}
