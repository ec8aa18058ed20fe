//! HTTP-level tests for the auth and user routes
//!
//! Runs the full router against the in-memory store with a stub Firebase
//! verifier.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use partner_api::build_router;
use partner_api::config::Config;
use partner_api::state::{AppState, Orchestrator, Store};
use partner_auth_core::{FederatedClaims, FederatedVerifier, VerifierError};
use serde_json::{json, Value};
use tower::ServiceExt;

const FIREBASE_TOKEN: &str = "firebase-id-token";
const BYPASS_TOKEN: &str = "dev-bypass-access";
const BYPASS_REFRESH: &str = "dev-bypass-refresh";

/// Accepts exactly one federated token
struct StubVerifier;

#[async_trait]
impl FederatedVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> Result<FederatedClaims, VerifierError> {
        if token == FIREBASE_TOKEN {
            Ok(FederatedClaims {
                uid: "firebase-uid-1".to_string(),
                email: Some("alice@example.com".to_string()),
                name: Some("Alice".to_string()),
            })
        } else {
            Err(VerifierError::InvalidToken)
        }
    }
}

fn config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("STORE_BACKEND", "memory"),
        ("JWT_SECRET_KEY", "routes-test-secret-at-least-32-bytes!"),
        ("FIREBASE_PROJECT_ID", "partner-test"),
        ("METRICS_ENABLED", "false"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert((*k).to_string(), (*v).to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

fn app_with(config: Config) -> Router {
    let store = Store::memory();
    let auth = Orchestrator::new(
        config.auth.clone(),
        Arc::new(StubVerifier),
        Arc::new(store.user_repository()),
        Arc::new(store.refresh_token_repository()),
        tracing::Span::none(),
    )
    .unwrap();
    build_router(AppState::new(auth, store, config), None)
}

fn app() -> Router {
    app_with(config(&[]))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_bearer(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn login(app: &Router) -> Value {
    let (status, body) = send(
        app,
        post_json("/api/auth/login", json!({ "firebase_token": FIREBASE_TOKEN })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_returns_pair_and_user() {
    let app = app();
    let body = login(&app).await;

    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["token_type"], "Bearer");
    let expires_in = body["expires_in"].as_i64().unwrap();
    assert!(expires_in > 3500 && expires_in <= 3600);

    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["diamonds"], 0);
    assert!(body["user"]["id"].as_str().is_some());
    assert!(body["user"]["created_at"].as_str().is_some());
}

#[tokio::test]
async fn test_repeat_login_keeps_identity() {
    let app = app();
    let first = login(&app).await;
    let second = login(&app).await;
    assert_eq!(first["user"]["id"], second["user"]["id"]);
    assert_ne!(first["refresh_token"], second["refresh_token"]);
}

#[tokio::test]
async fn test_login_rejected_token() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json("/api/auth/login", json!({ "firebase_token": "forged" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], "Unauthorized");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["message"], "Invalid request format");
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, post_json("/api/auth/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_rotates_and_rejects_reuse() {
    let app = app();
    let session = login(&app).await;
    let original = session["refresh_token"].as_str().unwrap().to_string();

    let (status, rotated) = send(
        &app,
        post_json("/api/auth/refresh", json!({ "refresh_token": original })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rotated["token_type"], "Bearer");
    assert_ne!(rotated["refresh_token"].as_str().unwrap(), original);

    let (status, body) = send(
        &app,
        post_json("/api/auth/refresh", json!({ "refresh_token": original })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_REFRESH_TOKEN");
    assert_eq!(body["error"]["message"], "Invalid refresh token");

    // The successor is still good
    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/refresh",
            json!({ "refresh_token": rotated["refresh_token"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let app = app();
    let session = login(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/refresh",
            json!({ "refresh_token": session["access_token"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_REFRESH_TOKEN");
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_is_idempotent_and_revokes() {
    let app = app();
    let session = login(&app).await;
    let refresh_token = session["refresh_token"].clone();

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            post_json("/api/auth/logout", json!({ "refresh_token": refresh_token })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Logout successfully");
    }

    let (status, _) = send(
        &app,
        post_json("/api/auth/refresh", json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_me_with_access_token() {
    let app = app();
    let session = login(&app).await;

    let (status, body) = send(
        &app,
        get_with_bearer("/api/users/me", session["access_token"].as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], session["user"]["id"]);
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn test_me_requires_access_token() {
    let app = app();
    let session = login(&app).await;

    let (status, body) = send(&app, get_with_bearer("/api/users/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // A refresh token is not a bearer credential
    let (status, _) = send(
        &app,
        get_with_bearer("/api/users/me", session["refresh_token"].as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Bypass mode
// ============================================================================

fn bypass_app() -> Router {
    app_with(config(&[
        ("BYPASS_ENABLED", "true"),
        ("BYPASS_TOKEN", BYPASS_TOKEN),
        ("BYPASS_REFRESH_TOKEN", BYPASS_REFRESH),
    ]))
}

#[tokio::test]
async fn test_bypass_session_lifecycle() {
    let app = bypass_app();

    let (status, body) = send(
        &app,
        post_json("/api/auth/login", json!({ "firebase_token": BYPASS_TOKEN })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], BYPASS_TOKEN);
    assert_eq!(body["refresh_token"], BYPASS_REFRESH);

    let (status, body) = send(
        &app,
        post_json("/api/auth/refresh", json!({ "refresh_token": BYPASS_REFRESH })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refresh_token"], BYPASS_REFRESH);

    let (status, me) = send(&app, get_with_bearer("/api/users/me", Some(BYPASS_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], "00000000-0000-0000-0000-000000000001");
}

#[tokio::test]
async fn test_bypass_credentials_rejected_when_disabled() {
    let app = app();

    let (status, _) = send(
        &app,
        post_json("/api/auth/login", json!({ "firebase_token": BYPASS_TOKEN })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_with_bearer("/api/users/me", Some(BYPASS_TOKEN))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_ready() {
    let app = app();

    let (status, body) = send(&app, get_with_bearer("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "partner-api");

    let (status, body) = send(&app, get_with_bearer("/ready", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["store"]["backend"], "memory");
}
