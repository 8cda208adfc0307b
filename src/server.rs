//! Assembly of the full HTTP application

use axum::http::HeaderValue;
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::api;
use crate::config::Config;
use crate::redirect;
use crate::storage::Storage;

/// Management API, QR endpoints and redirects on one router
pub fn create_app(storage: Arc<dyn Storage>, config: Arc<Config>) -> Router {
    let redirect_router =
        redirect::create_redirect_router(Arc::clone(&storage), config.redirect_status);
    let api_router = api::create_api_router(storage, Arc::clone(&config));

    let mut app = api_router
        .merge(redirect_router)
        .layer(cors_layer(&config.allowed_origins));

    if let Some(ref static_dir) = config.frontend.static_dir {
        // Unknown paths fall back to index.html for client-side routing
        let index = Path::new(static_dir).join("index.html");
        app = app.fallback_service(ServeDir::new(static_dir).not_found_service(ServeFile::new(index)));
    }

    app
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
