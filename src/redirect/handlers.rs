use axum::{
    extract::{Path, State},
    http::header::{HeaderMap, HeaderValue, LOCATION},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;

use crate::api::ApiError;
use crate::config::RedirectMode;
use crate::storage::Storage;

pub struct RedirectState {
    pub storage: Arc<dyn Storage>,
    pub redirect_status: RedirectMode,
}

/// Redirect to the destination of `slug`, counting the click
pub async fn redirect_link(
    State(state): State<Arc<RedirectState>>,
    Path(slug): Path<String>,
) -> Response {
    let started = Instant::now();
    let link = match state.storage.get(&slug).await {
        Ok(Some(link)) => link,
        Ok(None) => return ApiError::NotFound("Not found".to_string()).into_response(),
        Err(e) => return ApiError::Internal(e).into_response(),
    };

    let location = match HeaderValue::from_str(&link.url) {
        Ok(value) => value,
        Err(e) => {
            return ApiError::Internal(anyhow::anyhow!(
                "stored URL for slug '{slug}' is not a valid header value: {e}"
            ))
            .into_response();
        }
    };

    if let Err(err) = state.storage.increment_clicks(link.id, 1).await {
        tracing::warn!(slug = %slug, error = %err, "failed to record click");
    }

    let elapsed = started.elapsed();
    tracing::debug!(
        slug = %slug,
        elapsed_ms = elapsed.as_millis() as u64,
        "redirect resolved"
    );

    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, location);
    headers.insert(
        "x-shorty-timing-ms",
        HeaderValue::from(elapsed.as_millis() as u64),
    );

    (state.redirect_status.status_code(), headers).into_response()
}
