//! Router assembly. Everything except the common routes lives under `/{api_name}`.

mod common;
mod entity;
mod vocab;

pub use common::common_routes;
pub use entity::entity_routes;
pub use vocab::vocab_routes;

use crate::response::status_body;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::header,
    middleware::map_response,
    response::{IntoResponse, Response},
    Json, Router,
};
use tower_http::limit::RequestBodyLimitLayer;

/// Documentation and instance routes, unprefixed.
pub fn api_routes(state: AppState) -> Router {
    vocab_routes(state.clone()).merge(entity_routes(state))
}

/// `body_limit` replaces axum's default extractor limit, in both directions.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    let prefix = format!("/{}", state.api_name);
    Router::new()
        .nest(&prefix, api_routes(state.clone()))
        .merge(common_routes(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(map_response(status_keyed_errors))
}

/// Rewrites plain-text errors from the router and middleware (unmatched route,
/// wrong method, body too large) into `{"<code>": reason}`.
async fn status_keyed_errors(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with("application/json"));
    if !(status.is_client_error() || status.is_server_error()) || is_json {
        return response;
    }
    let reason = status.canonical_reason().unwrap_or("request failed");
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_TYPE);
    let body = Json(status_body(status.as_u16(), reason.to_string()));
    (parts, body).into_response()
}
