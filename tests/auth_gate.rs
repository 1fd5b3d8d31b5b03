//! HTTP password gate behavior, exercised through the real router with
//! tower's `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use trendlens::mcp::auth::{AuthConfig, PASSWORD_HEADER};
use trendlens::mcp::http::app;
use trendlens::ServiceRegistry;

fn gated_app(password: Option<&str>) -> (TempDir, Router) {
    let tmp = TempDir::new().unwrap();
    let registry = Arc::new(ServiceRegistry::new(tmp.path()).unwrap());
    let auth = AuthConfig::new(password.map(|p| p.to_string()));
    (tmp, app(registry, auth))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn open_mode_admits_anonymous_requests() {
    let (_tmp, app) = gated_app(None);
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn correct_header_is_admitted() {
    let (_tmp, app) = gated_app(Some("s3cret"));
    let response = app
        .oneshot(
            Request::get("/health")
                .header(PASSWORD_HEADER, "s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn correct_query_param_is_admitted() {
    let (_tmp, app) = gated_app(Some("s3cret"));
    let response = app
        .oneshot(
            Request::get("/health?pwd=s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_header_is_rejected_even_with_correct_query() {
    // A non-empty header takes precedence over the query parameter.
    let (_tmp, app) = gated_app(Some("s3cret"));
    let response = app
        .oneshot(
            Request::get("/health?pwd=s3cret")
                .header(PASSWORD_HEADER, "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn empty_header_falls_back_to_query() {
    let (_tmp, app) = gated_app(Some("s3cret"));
    let response = app
        .oneshot(
            Request::get("/health?pwd=s3cret")
                .header(PASSWORD_HEADER, "")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_credential_yields_forbidden_envelope() {
    let (_tmp, app) = gated_app(Some("s3cret"));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Forbidden");
    assert!(body["message"].as_str().is_some());
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn mcp_route_is_gated_too() {
    let (_tmp, app) = gated_app(Some("s3cret"));
    let response = app
        .oneshot(
            Request::post("/mcp")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
