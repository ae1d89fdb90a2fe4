//! Response bodies keyed by status code, e.g. `{"201": "Object with ID 7 successfully added"}`.

use axum::{
    http::{header, HeaderName, StatusCode},
    Json,
};
use serde_json::{Map, Value};

pub fn status_body(code: u16, message: String) -> Value {
    let mut map = Map::new();
    map.insert(code.to_string(), Value::String(message));
    Value::Object(map)
}

/// 201 with the created resource's `@id`, also sent as `Location`.
pub fn created(id: &str, at: String) -> (StatusCode, [(HeaderName, String); 1], Json<Value>) {
    let mut body = status_body(201, format!("Object with ID {} successfully added", id));
    if let Value::Object(ref mut m) = body {
        m.insert("@id".into(), Value::String(at.clone()));
    }
    (StatusCode::CREATED, [(header::LOCATION, at)], Json(body))
}

pub fn updated(id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(status_body(200, format!("Object with ID {} successfully updated", id))),
    )
}

pub fn deleted(id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(status_body(200, format!("Object with ID {} successfully deleted", id))),
    )
}

pub fn ok(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(data))
}
