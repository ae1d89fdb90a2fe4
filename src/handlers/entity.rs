//! Instance handlers: collection list/insert, item get/insert/update/delete.

use crate::error::{AppError, CrudError};
use crate::response;
use crate::service::{instance_iri, CrudService};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::Value;

const COLLECTION_SUFFIX: &str = "Collection";

pub(crate) fn parse_body(body: &Bytes) -> Result<Value, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("request body is empty".into()));
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON: {}", e)))
}

/// `DroneCollection` → `Drone`. Anything else is not a route.
fn collection_class(segment: &str) -> Result<&str, AppError> {
    segment
        .strip_suffix(COLLECTION_SUFFIX)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::NotFound(format!("no resource at {}", segment)))
}

/// The body's `@type` must name the class in the path.
fn check_type(object: &Value, class_name: &str) -> Result<(), AppError> {
    match object.get("@type").and_then(Value::as_str) {
        Some(t) if t != class_name => Err(CrudError::InvalidClass(t.to_string()).into()),
        _ => Ok(()),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let class_name = collection_class(&segment)?;
    let collection = CrudService::collection(state.store(), &state.api_name, class_name).await?;
    Ok(response::ok(collection))
}

pub async fn create(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let class_name = collection_class(&segment)?;
    let object = parse_body(&body)?;
    check_type(&object, class_name)?;
    let id = CrudService::insert(state.store(), &object, None).await?;
    Ok(response::created(&id, instance_iri(&state.api_name, class_name, &id)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((class_name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let object = CrudService::get(state.store(), &state.api_name, &id, Some(&class_name)).await?;
    Ok(response::ok(object))
}

pub async fn create_with_id(
    State(state): State<AppState>,
    Path((class_name, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let object = parse_body(&body)?;
    check_type(&object, &class_name)?;
    let id = CrudService::insert(state.store(), &object, Some(&id)).await?;
    Ok(response::created(&id, instance_iri(&state.api_name, &class_name, &id)))
}

pub async fn update(
    State(state): State<AppState>,
    Path((class_name, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let object = parse_body(&body)?;
    check_type(&object, &class_name)?;
    CrudService::update(state.store(), &id, Some(&class_name), &object).await?;
    Ok(response::updated(&id))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((class_name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    CrudService::delete(state.store(), &id, Some(&class_name)).await?;
    Ok(response::deleted(&id))
}
