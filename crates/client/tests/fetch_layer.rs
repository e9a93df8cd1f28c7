//! End-to-end tests for the fetch layer against an in-process axum server.
//!
//! Each test binds an ephemeral port, serves a small router that mimics
//! the backend's response shapes, and drives [`ApiClient`] against it.

use std::sync::Arc;

use assert_matches::assert_matches;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use logibooks_client::{ApiClient, ApiError, ClientConfig, RegistersApi, Reply, SessionStore};
use logibooks_core::{JobHandle, Locale};
use reqwest::Method;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Test server
// ---------------------------------------------------------------------------

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "auth": auth }))
}

async fn echo_body(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "contentType": content_type, "body": body }))
}

fn router() -> Router {
    Router::new()
        .route("/api/echo-auth", get(echo_auth))
        .route("/other/echo-auth", get(echo_auth))
        .route("/api/echo-body", post(echo_body))
        .route(
            "/api/unauthorized",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "Token expired" }))) }),
        )
        .route(
            "/api/rows",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "msg": "Invalid rows", "rows": [2] })),
                )
            }),
        )
        .route("/api/gone", delete(|| async { StatusCode::NO_CONTENT }))
        .route(
            "/api/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/api/registers/1/validate",
            post(|| async { Json(json!({ "id": 7 })) }),
        )
        .route(
            "/api/registers/validate/7",
            get(|| async { Json(json!({ "total": 10, "processed": 10, "finished": true })) }),
        )
        .route(
            "/api/registers/1/lookup-feacn-codes",
            post(|| async { Json(json!({ "id": "c0ffee" })) }),
        )
}

/// Serve [`router`] on an ephemeral port and return the server's origin.
async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(origin: &str, locale: Locale) -> ApiClient {
    let mut config = ClientConfig::new(format!("{origin}/api").parse().unwrap());
    config.locale = locale;
    ApiClient::new(&config, Arc::new(SessionStore::new())).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bearer_token_sent_only_inside_api() {
    let origin = spawn_server().await;
    let api = client_for(&origin, Locale::En);
    api.session().open("t0k3n").await;

    let inside: Value = api.get_json("/echo-auth").await.unwrap();
    assert_eq!(inside["auth"], "Bearer t0k3n");

    let outside: Value = api
        .get_json(&format!("{origin}/other/echo-auth"))
        .await
        .unwrap();
    assert!(outside["auth"].is_null());
}

#[tokio::test]
async fn no_token_without_session() {
    let origin = spawn_server().await;
    let api = client_for(&origin, Locale::En);

    let reply: Value = api.get_json("/echo-auth").await.unwrap();
    assert!(reply["auth"].is_null());
}

#[tokio::test]
async fn json_body_sets_content_type() {
    let origin = spawn_server().await;
    let api = client_for(&origin, Locale::En);

    let reply: Value = api
        .post_json("/echo-body", Some(&json!({ "name": "alcohol" })))
        .await
        .unwrap();
    assert_eq!(reply["contentType"], "application/json");
    assert_eq!(reply["body"]["name"], "alcohol");
}

#[tokio::test]
async fn unauthorized_closes_session() {
    let origin = spawn_server().await;
    let api = client_for(&origin, Locale::En);
    api.session().open("stale").await;

    let err = api.get_json::<Value>("/unauthorized").await.unwrap_err();

    assert_matches!(&err, ApiError::Status { status: 401, .. });
    assert_eq!(err.to_string(), "Token expired");
    assert!(!api.session().is_active().await);
}

#[tokio::test]
async fn unprocessable_is_returned_as_reply() {
    let origin = spawn_server().await;
    let api = client_for(&origin, Locale::En);

    let reply = api.send(Method::POST, "/rows", None).await.unwrap();
    assert_matches!(reply, Reply::Unprocessable(payload) if payload["rows"][0] == 2);
}

#[tokio::test]
async fn no_content_resolves_empty() {
    let origin = spawn_server().await;
    let api = client_for(&origin, Locale::En);

    let reply = api.send(Method::DELETE, "/gone", None).await.unwrap();
    assert_eq!(reply, Reply::Empty);
    api.delete("/gone").await.unwrap();
}

#[tokio::test]
async fn server_error_carries_text_body() {
    let origin = spawn_server().await;
    let api = client_for(&origin, Locale::En);

    let err = api.get_json::<Value>("/broken").await.unwrap_err();
    assert_matches!(&err, ApiError::Status { status: 500, payload: None, .. });
    assert_eq!(err.to_string(), "boom");
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn unreachable_server_uses_localized_message() {
    // Bind then drop to obtain a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client_for(&format!("http://{addr}"), Locale::Ru);
    let err = api.get_json::<Value>("/echo-auth").await.unwrap_err();

    assert_matches!(&err, ApiError::Unreachable(_));
    assert_eq!(err.to_string(), Locale::Ru.labels().server_unreachable);
}

#[tokio::test]
async fn register_job_endpoints() {
    let origin = spawn_server().await;
    let registers = RegistersApi::new(Arc::new(client_for(&origin, Locale::En)));

    let handle = registers.start_validation(1).await.unwrap();
    assert_eq!(handle, JobHandle::new("7").unwrap());

    let progress = registers.validation_progress(&handle).await.unwrap();
    assert!(progress.finished);
    assert_eq!(progress.processed, 10);

    let lookup = registers.start_feacn_lookup(1, false).await.unwrap();
    assert_eq!(lookup.as_str(), "c0ffee");
}
