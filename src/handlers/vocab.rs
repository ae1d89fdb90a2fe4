//! Documentation handlers: entry point, stored ApiDocumentation, import, contexts.

use crate::doc::{self, context};
use crate::error::AppError;
use crate::handlers::entity::parse_body;
use crate::response;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

pub async fn entry_point(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let classes = CrudService::classes(state.store()).await?;
    Ok(response::ok(context::entry_point(&state.api_name, &classes)))
}

pub async fn get_vocab(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stored = doc::stored_document(state.store())
        .await?
        .ok_or_else(|| AppError::NotFound("no API documentation has been imported".into()))?;
    Ok(response::ok(stored.payload))
}

/// Import a Hydra ApiDocumentation or an OWL/RDFS graph.
pub async fn post_vocab(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let document = parse_body(&body)?;
    let report = doc::import_document(state.store(), &document).await?;
    Ok((StatusCode::OK, Json(report)))
}

pub async fn get_context(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let name = file.strip_suffix(".jsonld").unwrap_or(&file);
    let classes = CrudService::classes(state.store()).await?;
    let properties = CrudService::properties(state.store()).await?;
    let ctx = context::context_for(&state.api_name, name, &classes, &properties)
        .ok_or_else(|| AppError::NotFound(format!("no context named {}", name)))?;
    Ok(response::ok(ctx))
}
