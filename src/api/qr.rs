//! QR code endpoints

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use super::handlers::AppState;
use crate::qr::{render_png, short_url};
use crate::slug::validate_slug;

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    pub slug: Option<String>,
}

/// Render the QR code for `{public_base_url}/r/{slug}`
///
/// The slug does not have to exist; the image only depends on it.
pub async fn qr_code(
    State(state): State<Arc<AppState>>,
    query: Result<Query<QrQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let slug = query
        .slug
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("Query parameter 'slug' is required".to_string()))?;
    validate_slug(&slug).map_err(|e| ApiError::Validation(e.to_string()))?;

    png_response(short_url(&state.config.public_base_url, &slug)).await
}

/// Render the QR code of an existing link
pub async fn link_qr(
    State(state): State<Arc<AppState>>,
    slug: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(slug) = slug?;
    let link = state
        .storage
        .get(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    png_response(short_url(&state.config.public_base_url, &link.slug)).await
}

async fn png_response(payload: String) -> Result<Response, ApiError> {
    let png = tokio::task::spawn_blocking(move || render_png(&payload))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        png,
    )
        .into_response())
}
