//! Redirect integration tests
//!
//! These tests verify that the redirect functionality works correctly,
//! including concurrent redirects and click counting.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use shorty::config::RedirectMode;
use shorty::redirect;
use shorty::storage::{CachedStorage, SqliteStorage, Storage};
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn redirect_request(slug: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/r/{slug}"))
        .body(Body::empty())
        .unwrap()
}

async fn hit_concurrently(app: &Router, slug: &'static str, count: usize) {
    let mut handles = vec![];
    for _ in 0..count {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(redirect_request(slug)).await.unwrap().status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::FOUND);
    }
}

#[tokio::test]
async fn test_redirect_existing_link() {
    let storage = create_test_storage().await;
    storage
        .create_with_slug("redirect_test", "https://example.com/destination")
        .await
        .unwrap();

    let app = redirect::create_redirect_router(storage.clone(), RedirectMode::default());
    let response = app.oneshot(redirect_request("redirect_test")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()["location"],
        "https://example.com/destination"
    );
    assert!(response.headers().contains_key("x-shorty-timing-ms"));

    let link = storage.get("redirect_test").await.unwrap().unwrap();
    assert_eq!(link.clicks, 1);
}

#[tokio::test]
async fn test_redirect_nonexistent_slug() {
    let storage = create_test_storage().await;
    let app = redirect::create_redirect_router(storage, RedirectMode::default());

    let response = app.oneshot(redirect_request("nonexistent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["detail"], "Not found");
}

#[tokio::test]
async fn test_unusable_destination_is_json_error() {
    let storage = create_test_storage().await;
    // Written straight to storage, bypassing URL validation
    storage
        .create_with_slug("broken", "https://example.com/a\nb")
        .await
        .unwrap();

    let app = redirect::create_redirect_router(storage.clone(), RedirectMode::default());
    let response = app.oneshot(redirect_request("broken")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.headers().contains_key("location"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, serde_json::json!({ "detail": "Internal server error" }));

    // No click is counted for a failed redirect
    assert_eq!(storage.get("broken").await.unwrap().unwrap().clicks, 0);
}

#[tokio::test]
async fn test_configured_redirect_status() {
    let storage = create_test_storage().await;
    storage
        .create_with_slug("perm", "https://example.com/")
        .await
        .unwrap();

    for (mode, expected) in [
        (RedirectMode::Temporary, StatusCode::TEMPORARY_REDIRECT),
        (RedirectMode::Permanent, StatusCode::PERMANENT_REDIRECT),
    ] {
        let app = redirect::create_redirect_router(storage.clone(), mode);
        let response = app.oneshot(redirect_request("perm")).await.unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
async fn test_concurrent_redirects() {
    // Direct storage: every click is a single atomic UPDATE
    let storage = create_test_storage().await;
    storage
        .create_with_slug("popular", "https://example.com")
        .await
        .unwrap();

    let app = redirect::create_redirect_router(storage.clone(), RedirectMode::default());
    hit_concurrently(&app, "popular", 50).await;

    let link = storage.get("popular").await.unwrap().unwrap();
    assert_eq!(link.clicks, 50, "no click may be lost");
}

#[tokio::test]
async fn test_concurrent_redirects_through_click_buffer() {
    let sqlite = create_test_storage().await;
    let cached = Arc::new(CachedStorage::new(Arc::clone(&sqlite), 1000, 300, 3600));
    cached
        .create_with_slug("buffered", "https://example.com")
        .await
        .unwrap();

    let app = redirect::create_redirect_router(
        Arc::clone(&cached) as Arc<dyn Storage>,
        RedirectMode::default(),
    );
    hit_concurrently(&app, "buffered", 100).await;

    assert_eq!(cached.list(10, 0).await.unwrap()[0].clicks, 100);

    cached.shutdown().await.unwrap();
    let link = sqlite.get("buffered").await.unwrap().unwrap();
    assert_eq!(link.clicks, 100, "buffered clicks must all reach the store");
}
