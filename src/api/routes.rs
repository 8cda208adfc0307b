use axum::{middleware, routing::get, Router};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::config::Config;
use crate::storage::Storage;

use super::handlers::{create_link, delete_link, get_link, health_check, list_links, AppState};
use super::qr::{link_qr, qr_code};
use super::rate_limit::{ip_rate_limiter, rate_limit};

pub fn create_api_router(storage: Arc<dyn Storage>, config: Arc<Config>) -> Router {
    let rate_limit_per_minute = config.rate_limit_per_minute;
    let state = Arc::new(AppState { storage, config });

    let mut link_routes = Router::new()
        .route("/api/links", get(list_links).post(create_link))
        .route("/api/links/{key}", get(get_link).delete(delete_link))
        .route("/api/links/{key}/qr", get(link_qr));

    if let Some(per_minute) = NonZeroU32::new(rate_limit_per_minute) {
        let limiter = ip_rate_limiter(per_minute);
        link_routes = link_routes.route_layer(middleware::from_fn_with_state(limiter, rate_limit));
    }

    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/qr", get(qr_code))
        .merge(link_routes)
        .with_state(state)
}
