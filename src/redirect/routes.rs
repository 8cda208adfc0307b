use axum::{routing::get, Router};
use std::sync::Arc;

use crate::config::RedirectMode;
use crate::storage::Storage;

use super::handlers::{redirect_link, RedirectState};

pub fn create_redirect_router(storage: Arc<dyn Storage>, redirect_status: RedirectMode) -> Router {
    let state = Arc::new(RedirectState {
        storage,
        redirect_status,
    });

    Router::new()
        .route("/r/{slug}", get(redirect_link))
        .with_state(state)
}
