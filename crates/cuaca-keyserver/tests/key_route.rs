//! Exercises the key route through the router without binding a socket.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use cuaca_keyserver::{routes, ErrorBody, KeyBody, KeyState};
use tower::ServiceExt;

async fn call(state: KeyState, method: Method) -> (StatusCode, Vec<u8>) {
    let response = routes(Arc::new(state))
        .oneshot(
            Request::builder()
                .method(method)
                .uri("/api/key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_get_returns_key() {
    let (status, body) = call(KeyState::new(Some("abc123".into())), Method::GET).await;

    assert_eq!(status, StatusCode::OK);
    let body: KeyBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(body.key, "abc123");
}

#[tokio::test]
async fn test_post_not_allowed() {
    let (status, body) = call(KeyState::new(Some("abc123".into())), Method::POST).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let body: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(body.error, "Method not allowed");
}

#[tokio::test]
async fn test_delete_not_allowed() {
    let (status, _) = call(KeyState::new(Some("abc123".into())), Method::DELETE).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_missing_key() {
    let (status, body) = call(KeyState::new(None), Method::GET).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(body.error, "API key not configured");
}

#[tokio::test]
async fn test_blank_key_counts_as_missing() {
    let state = KeyState::new(Some("   ".into()));
    assert!(!state.has_key());

    let (status, _) = call(state, Method::GET).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unknown_path() {
    let response = routes(Arc::new(KeyState::default()))
        .oneshot(Request::builder().uri("/api/other").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
