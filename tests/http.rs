//! End-to-end HTTP tests against the in-memory store.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use hydrus::{build_router, AppState, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn api_doc() -> Value {
    json!({
        "@context": "/api/contexts/ApiDocumentation.jsonld",
        "@id": "/api/vocab",
        "@type": "ApiDocumentation",
        "title": "Drone API",
        "supportedClass": [
            {
                "@id": "vocab:Drone",
                "@type": "hydra:Class",
                "title": "Drone",
                "supportedProperty": [
                    {"property": "vocab:name", "title": "name"},
                    {"property": "vocab:MaxSpeed", "title": "MaxSpeed"},
                    {
                        "property": {"@id": "vocab:DroneState", "@type": "hydra:Link", "range": "vocab:State"},
                        "title": "DroneState"
                    },
                    {
                        "property": {"@id": "vocab:operatesIn", "range": "rdfs:Class"},
                        "title": "operatesIn"
                    }
                ]
            },
            {
                "@id": "vocab:State",
                "@type": "hydra:Class",
                "title": "State",
                "supportedProperty": [{"property": "vocab:Battery", "title": "Battery"}]
            },
            {"@id": "vocab:Area", "@type": "hydra:Class", "title": "Area"}
        ]
    })
}

async fn app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), "api");
    let app = build_router(state, 64 * 1024);
    let (status, _) = send(&app, Method::POST, "/api/vocab", Some(api_doc())).await;
    assert_eq!(status, StatusCode::OK);
    app
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, json) = send_full(app, method, uri, body).await;
    (status, json)
}

async fn send_full(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/ld+json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, location, json)
}

#[tokio::test]
async fn common_routes_respond() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "memory");

    let (_, body) = send(&app, Method::GET, "/version", None).await;
    assert_eq!(body["name"], "hydrus");
}

#[tokio::test]
async fn entry_point_vocab_and_contexts() {
    let app = app().await;
    let (status, ep) = send(&app, Method::GET, "/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ep["@type"], "EntryPoint");
    assert_eq!(ep["DroneCollection"], "/api/DroneCollection");

    let (status, vocab) = send(&app, Method::GET, "/api/vocab", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vocab, api_doc());

    let (status, ctx) = send(&app, Method::GET, "/api/contexts/Drone.jsonld", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx["@context"]["DroneState"]["@type"], "@id");

    let (status, _) = send(&app, Method::GET, "/api/contexts/Ghost.jsonld", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn vocab_is_not_found_before_import() {
    let app = build_router(AppState::new(Arc::new(MemoryStore::new()), "api"), 1024);
    let (status, _) = send(&app, Method::GET, "/api/vocab", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::POST, "/api/vocab", Some(json!({"nothing": true}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_with_id_then_get_round_trips() {
    let app = app().await;
    let drone = json!({
        "@type": "Drone",
        "name": "Sandstorm",
        "MaxSpeed": 120,
        "operatesIn": "Area",
        "DroneState": {"@type": "State", "Battery": "full"}
    });
    let (status, location, body) = send_full(&app, Method::PUT, "/api/Drone/d1", Some(drone)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(location.as_deref(), Some("/api/Drone/d1"));
    assert_eq!(body["@id"], "/api/Drone/d1");

    let (status, got) = send(&app, Method::GET, "/api/Drone/d1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(got["@type"], "Drone");
    assert_eq!(got["name"], "Sandstorm");
    assert_eq!(got["MaxSpeed"], 120);
    assert_eq!(got["operatesIn"], "Area");
    assert_eq!(got["DroneState"]["@type"], "State");
    assert_eq!(got["DroneState"]["Battery"], "full");

    let (status, listing) = send(&app, Method::GET, "/api/StateCollection", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["members"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn collection_put_generates_id() {
    let app = app().await;
    let (status, location, _) = send_full(
        &app,
        Method::PUT,
        "/api/DroneCollection",
        Some(json!({"@type": "Drone", "name": "gen"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let location = location.unwrap();
    assert!(location.starts_with("/api/Drone/"));

    let (status, got) = send(&app, Method::GET, &location, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(got["@id"], location.as_str());

    let (_, listing) = send(&app, Method::GET, "/api/DroneCollection", None).await;
    assert_eq!(listing["@type"], "DroneCollection");
    assert_eq!(listing["members"][0]["@id"], location.as_str());
}

#[tokio::test]
async fn errors_carry_domain_codes() {
    let app = app().await;
    send(&app, Method::PUT, "/api/Drone/1", Some(json!({"@type": "Drone"}))).await;

    let cases = [
        ("/api/Drone/1", json!({"@type": "Drone"}), StatusCode::BAD_REQUEST),
        ("/api/Drone/2", json!({"@type": "State"}), StatusCode::UNAUTHORIZED),
        ("/api/Ghost/2", json!({"@type": "Ghost"}), StatusCode::UNAUTHORIZED),
        ("/api/Drone/2", json!({"@type": "Drone", "colour": "red"}), StatusCode::PAYMENT_REQUIRED),
        ("/api/Drone/2", json!({"@type": "Drone", "DroneState": "nope"}), StatusCode::FORBIDDEN),
    ];
    for (uri, body, expected) in cases {
        let (status, json) = send(&app, Method::PUT, uri, Some(body)).await;
        assert_eq!(status, expected, "{}", uri);
        assert!(json.get(expected.as_u16().to_string()).is_some(), "{}", json);
    }

    let (status, _) = send(&app, Method::GET, "/api/GhostCollection", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/api/Drone", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/Drone/1")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, "/api/Drone/1", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_then_delete() {
    let app = app().await;
    send(&app, Method::PUT, "/api/Drone/1", Some(json!({"@type": "Drone", "name": "a"}))).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/Drone/1",
        Some(json!({"@type": "Drone", "name": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["200"], "Object with ID 1 successfully updated");
    let (_, got) = send(&app, Method::GET, "/api/Drone/1", None).await;
    assert_eq!(got["name"], "b");

    let (status, _) = send(&app, Method::POST, "/api/Drone/9", Some(json!({"@type": "Drone"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/Drone/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::GET, "/api/Drone/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["404"], "Instance with ID : 1 not found");
    let (status, _) = send(&app, Method::DELETE, "/api/Drone/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = build_router(AppState::new(Arc::new(MemoryStore::new()), "api"), 16);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/vocab",
        Some(json!({"@type": "ApiDocumentation", "supportedClass": []})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["413"], "Payload Too Large");
}

#[tokio::test]
async fn configured_limit_above_axum_default_is_honoured() {
    let app = build_router(AppState::new(Arc::new(MemoryStore::new()), "api"), 8 * 1024 * 1024);
    let mut doc = api_doc();
    doc["description"] = Value::String("x".repeat(3 * 1024 * 1024));
    let (status, report) = send(&app, Method::POST, "/api/vocab", Some(doc.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["classes_added"], 3);

    let (status, stored) = send(&app, Method::GET, "/api/vocab", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, doc);
}

#[tokio::test]
async fn router_errors_use_status_keyed_bodies() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/Drone/1/extra", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["404"], "Not Found");

    let (status, body) = send(&app, Method::DELETE, "/api/vocab", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["405"], "Method Not Allowed");

    let (status, body) = send(&app, Method::GET, "/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("404").is_some());
}

#[tokio::test]
async fn plain_property_with_values_rejects_nested_objects() {
    let app = app().await;
    send(&app, Method::PUT, "/api/Drone/a", Some(json!({"@type": "Drone", "name": "alpha"}))).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/Drone/b",
        Some(json!({"@type": "Drone", "name": {"@type": "State"}})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body.get("402").is_some());

    let (_, got) = send(&app, Method::GET, "/api/Drone/a", None).await;
    let (status, _) = send(&app, Method::POST, "/api/Drone/a", Some(got)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::PUT, "/api/Drone/c", Some(json!({"@type": "Drone", "name": "gamma"}))).await;
    assert_eq!(status, StatusCode::CREATED);
}
