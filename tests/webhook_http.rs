//! HTTP contract tests for the webhook endpoint.
//!
//! Exercises the signature gate through the real router: missing signature
//! header, missing secret configuration, signature mismatch, and the
//! always-acknowledge behavior for unhandled event types.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use subtrack::adapters::http::{app_router, AppState};
use subtrack::adapters::memory::{InMemoryRecordStore, InMemoryVerificationStore};
use subtrack::adapters::stripe::sign_for_tests;
use subtrack::test_utils::{MockGateway, MockMailer};

const SECRET: &str = "whsec_test_secret";

fn state(with_secret: bool) -> AppState {
    AppState {
        record_store: Arc::new(InMemoryRecordStore::new()),
        verification_store: Arc::new(InMemoryVerificationStore::new()),
        gateway: Arc::new(MockGateway::new()),
        mailer: Arc::new(MockMailer::new()),
        webhook_secret: with_secret.then(|| secrecy::SecretString::new(SECRET.to_string())),
    }
}

fn webhook_request(body: &[u8], signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/stripe/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

fn unhandled_event_payload() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": "evt_1",
        "type": "charge.refunded",
        "created": chrono::Utc::now().timestamp(),
        "data": { "object": {} }
    }))
    .unwrap()
}

#[tokio::test]
async fn missing_signature_header_is_bad_request() {
    let app = app_router(state(true), Duration::from_secs(5));

    let response = app
        .oneshot(webhook_request(b"{}", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Missing signature"));
}

#[tokio::test]
async fn missing_secret_configuration_is_server_error() {
    let app = app_router(state(false), Duration::from_secs(5));
    let payload = unhandled_event_payload();
    let signature = sign_for_tests(SECRET, chrono::Utc::now().timestamp(), &payload);

    let response = app
        .oneshot(webhook_request(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn invalid_signature_is_bad_request() {
    let app = app_router(state(true), Duration::from_secs(5));
    let payload = unhandled_event_payload();
    let signature = sign_for_tests("whsec_wrong_secret", chrono::Utc::now().timestamp(), &payload);

    let response = app
        .oneshot(webhook_request(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unhandled_event_type_is_acknowledged() {
    let app = app_router(state(true), Duration::from_secs(5));
    let payload = unhandled_event_payload();
    let signature = sign_for_tests(SECRET, chrono::Utc::now().timestamp(), &payload);

    let response = app
        .oneshot(webhook_request(&payload, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "received": true }));
}
