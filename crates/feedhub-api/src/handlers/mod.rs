//! HTTP request handlers organized by domain.

pub mod download;
pub mod feed;
pub mod files;
pub mod health;
pub mod refresh;
pub mod service;
pub mod upload;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// An XML body with an explicit `Content-Length`.
pub(crate) fn xml_response(content_type: &'static str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, body.len().to_string()),
        ],
        body,
    )
        .into_response()
}
