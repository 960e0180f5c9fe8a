//! Feed handlers: `Packages`, `Packages(Id=..,Version=..)` and `FindPackagesById()`.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use tracing::debug;

use feedhub_core::error::AppError;
use feedhub_protocol::{
    EntryDocument, FeedDocument, function_segment, media, parse_filter, parse_function_params,
    parse_quoted_value,
};
use feedhub_storage::FeedQuery;

use super::xml_response;
use crate::error::ApiError;
use crate::extractors::ApiKey;
use crate::state::AppState;

const PACKAGES: &str = "Packages";
const FIND_PACKAGES_BY_ID: &str = "FindPackagesById";

/// GET /{segment}
///
/// The segment is a feed function such as `Packages()` with its
/// parenthesised parameters.
pub async fn feed(
    State(state): State<AppState>,
    key: ApiKey,
    Path(segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    key.require_read(&state).await?;

    match function_name(&segment) {
        PACKAGES => {
            let function = parse_function_params(function_segment(&segment));
            if function.is_entry() {
                debug!(id = %function.id, version = %function.version, "Serving single entry");
                let record = state.backend.get_entry(&function.id, &function.version).await?;
                let body = EntryDocument::new(&record).to_bytes(&state.base_url)?;
                return Ok(xml_response(media::ATOM_FEED, body));
            }
            let filter = params.get("$filter").and_then(|f| parse_filter(f));
            serve_feed(&state, PACKAGES, filter, &params).await
        }
        FIND_PACKAGES_BY_ID => {
            let id = params
                .get("id")
                .map(|raw| parse_quoted_value(raw).unwrap_or_else(|| raw.trim().to_string()))
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AppError::validation("FindPackagesById requires an id"))?;
            serve_feed(&state, FIND_PACKAGES_BY_ID, Some(id), &params).await
        }
        other => Err(AppError::not_found(format!("Unknown feed function: {other}")).into()),
    }
}

async fn serve_feed(
    state: &AppState,
    title: &str,
    filter: Option<String>,
    params: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    let page_size = state.config.storage.feed_page_size;
    let query = FeedQuery {
        id_filter: filter,
        cursor: params
            .get("$skiptoken")
            .map(|raw| parse_quoted_value(raw).unwrap_or_else(|| raw.clone())),
        limit: page_limit(params.get("$top").map(String::as_str), page_size),
    };
    debug!(title, filter = ?query.id_filter, limit = query.limit, "Serving feed");

    let page = state.backend.get_feed_entries(&query).await?;
    let next = page
        .next_cursor
        .as_deref()
        .map(|cursor| next_href(title, query.filter(), cursor));
    let body = FeedDocument::new(title, &state.base_url, &page.entries)
        .with_next(next)
        .to_bytes()?;
    Ok(xml_response(media::ATOM_FEED, body))
}

/// `Packages(Id='x')` → `Packages`.
fn function_name(segment: &str) -> &str {
    segment.split('(').next().unwrap_or_default()
}

/// `$top` capped at the configured page size.
fn page_limit(top: Option<&str>, page_size: usize) -> usize {
    top.and_then(|t| t.trim().parse::<usize>().ok())
        .map_or(page_size, |top| top.min(page_size))
}

/// Continuation link for the page after `cursor`.
fn next_href(title: &str, filter: Option<&str>, cursor: &str) -> String {
    let mut href = format!("{title}?$skiptoken='{cursor}'");
    if let Some(id) = filter {
        href.push_str(&format!("&$filter=tolower(Id)%20eq%20'{id}'"));
    }
    href
}
