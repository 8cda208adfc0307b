//! Management API integration tests
//!
//! These tests drive the full application router in-process and check the
//! create/list/get/delete contract, including error bodies.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shorty::config::{Config, SlugConfig};
use shorty::qr::{render_data_uri, short_url};
use shorty::server::create_app;
use shorty::storage::{CachedStorage, SqliteStorage, Storage};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create test storage wrapped the way the server wraps it
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(CachedStorage::new(Arc::new(storage), 1000, 300, 3600))
}

/// Helper to create test config with rate limiting off
fn create_test_config() -> Arc<Config> {
    Arc::new(Config {
        rate_limit_per_minute: 0,
        ..Config::default()
    })
}

async fn create_test_app() -> Router {
    create_app(create_test_storage().await, create_test_config())
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
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_create_list_redirect_scenario() {
    let app = create_test_app().await;
    let destination = "https://example.com/very/long/path";

    let (status, created) = send(&app, post_json("/api/links", json!({ "url": destination }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let slug = created["slug"].as_str().unwrap().to_string();
    assert!(!slug.is_empty());
    assert_eq!(slug.len(), 6);
    assert_eq!(created["clicks"], 0);
    assert_eq!(created["url"], destination);
    assert!(created["id"].is_i64());
    assert!(created["createdAt"].is_string());

    // The QR code of the short URL comes back inline
    let expected_qr = render_data_uri(&short_url(&Config::default().public_base_url, &slug)).unwrap();
    assert_eq!(created["qrPng"], expected_qr.as_str());

    let (status, list) = send(&app, get("/api/links")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["slug"], slug.as_str());

    let response = app
        .clone()
        .oneshot(get(&format!("/r/{slug}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], destination);

    let (_, list) = send(&app, get("/api/links")).await;
    assert_eq!(list["items"][0]["clicks"], 1);

    let (status, fetched) = send(&app, get(&format!("/api/links/{slug}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["clicks"], 1);
}

#[tokio::test]
async fn test_create_normalizes_bare_host() {
    let app = create_test_app().await;
    let (status, created) = send(
        &app,
        post_json("/api/links", json!({ "url": "https://www.google.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["url"], "https://www.google.com/");
}

#[tokio::test]
async fn test_invalid_url_is_rejected_and_not_persisted() {
    let app = create_test_app().await;

    for bad in ["not-a-url", "", "ftp://example.com/file", "javascript:alert(1)"] {
        let (status, body) = send(&app, post_json("/api/links", json!({ "url": bad }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "url {bad:?}");
        assert!(
            !body["detail"].as_str().unwrap().is_empty(),
            "error body must carry a detail"
        );
    }

    let (_, list) = send(&app, get("/api/links")).await;
    assert_eq!(list["total"], 0);
    assert_eq!(list["items"], json!([]));
}

#[tokio::test]
async fn test_malformed_bodies_carry_detail() {
    let app = create_test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/links")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, body) = send(&app, post_json("/api/links", json!({ "link": "x" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_generated_slugs_are_unique() {
    let app = create_test_app().await;
    let mut slugs = HashSet::new();

    for i in 0..30 {
        let (status, created) = send(
            &app,
            post_json("/api/links", json!({ "url": format!("https://example.com/{i}") })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(slugs.insert(created["slug"].as_str().unwrap().to_string()));
    }

    let (_, list) = send(&app, get("/api/links?limit=100")).await;
    assert_eq!(list["items"].as_array().unwrap().len(), 30);
}

#[tokio::test]
async fn test_custom_slug() {
    let app = create_test_app().await;

    let (status, created) = send(
        &app,
        post_json(
            "/api/links",
            json!({ "url": "https://example.com", "customSlug": "my-link" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "my-link");

    let (status, body) = send(
        &app,
        post_json(
            "/api/links",
            json!({ "url": "https://example.org", "customSlug": "my-link" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Slug already exists");

    let (status, _) = send(
        &app,
        post_json(
            "/api/links",
            json!({ "url": "https://example.org", "customSlug": "no/slashes" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_concurrent_custom_slug_creation() {
    let app = create_test_app().await;

    let mut handles = vec![];
    for i in 0..10 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let request = post_json(
                "/api/links",
                json!({ "url": format!("https://example.com/{i}"), "customSlug": "contested" }),
            );
            app.oneshot(request).await.unwrap().status()
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 1, "exactly one creation should succeed");
    assert_eq!(conflicts, 9);
}

#[tokio::test]
async fn test_delete_link() {
    let app = create_test_app().await;

    let (_, keep) = send(&app, post_json("/api/links", json!({ "url": "https://keep.example.com" }))).await;
    let (_, doomed) = send(&app, post_json("/api/links", json!({ "url": "https://todelete.example.com" }))).await;
    let id = doomed["id"].as_i64().unwrap();
    let slug = doomed["slug"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/links/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get(&format!("/api/links/{slug}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get(&format!("/r/{slug}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, get("/api/links")).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["id"], keep["id"]);

    // Repeat delete reports not found
    let (status, body) = send(&app, delete(&format!("/api/links/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not found");
}

#[tokio::test]
async fn test_delete_unknown_id_leaves_store_unchanged() {
    let app = create_test_app().await;
    send(&app, post_json("/api/links", json!({ "url": "https://example.com/a" }))).await;
    let (_, before) = send(&app, get("/api/links")).await;

    let (status, body) = send(&app, delete("/api/links/999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());

    let (status, body) = send(&app, delete("/api/links/abc")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let (_, after) = send(&app, get("/api/links")).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_list_pagination() {
    let app = create_test_app().await;
    for i in 0..5 {
        send(
            &app,
            post_json("/api/links", json!({ "url": format!("https://example.com/{i}") })),
        )
        .await;
    }

    let (_, page) = send(&app, get("/api/links?limit=2&offset=1")).await;
    assert_eq!(page["total"], 5);
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Newest first: offset 1 skips https://example.com/4
    assert_eq!(items[0]["url"], "https://example.com/3");
    assert_eq!(items[1]["url"], "https://example.com/2");

    let (status, body) = send(&app, get("/api/links?limit=lots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_rate_limit() {
    let config = Arc::new(Config {
        rate_limit_per_minute: 3,
        ..Config::default()
    });
    let app = create_app(create_test_storage().await, config);

    for _ in 0..3 {
        let (status, _) = send(&app, get("/api/links")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get("/api/links")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["detail"], "Too many requests");

    // Health checks are not limited
    let (status, _) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_exhausted_slug_space_is_server_error() {
    let storage = create_test_storage().await;
    let config = Arc::new(Config {
        rate_limit_per_minute: 0,
        slugs: SlugConfig {
            length: 1,
            max_attempts: 3,
        },
        ..Config::default()
    });
    let app = create_app(Arc::clone(&storage), config);

    // Take every one-character slug
    for c in "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789".chars() {
        storage
            .create_with_slug(&c.to_string(), "https://example.com/taken")
            .await
            .unwrap();
    }

    let (status, body) = send(
        &app,
        post_json("/api/links", json!({ "url": "https://example.com/new" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "Could not generate unique slug" }));

    // Nothing was stored by the failed create
    let (_, list) = send(&app, get("/api/links")).await;
    assert_eq!(list["total"], 62);

    // A custom slug still works
    let (status, _) = send(
        &app,
        post_json(
            "/api/links",
            json!({ "url": "https://example.com/new", "customSlug": "longer" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
