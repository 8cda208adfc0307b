use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ApiError;
use crate::config::Config;
use crate::models::{CreateLinkRequest, CreatedLink, Link, LinkList};
use crate::qr::{render_data_uri, short_url};
use crate::slug::{generate_slug, validate_slug};
use crate::storage::{Storage, StorageError};
use crate::url_validator::normalize_url;

const MAX_LIST_LIMIT: i64 = 500;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Arc<Config>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Create a new short link, answering with its QR code inline
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedLink>), ApiError> {
    let Json(payload) = payload?;

    let url = normalize_url(&payload.url).map_err(|e| ApiError::Validation(e.to_string()))?;

    let link = match payload.custom_slug.as_deref().map(str::trim) {
        Some(custom) if !custom.is_empty() => {
            validate_slug(custom).map_err(|e| ApiError::Validation(e.to_string()))?;
            state.storage.create_with_slug(custom, &url).await?
        }
        _ => allocate_generated(&state, &url).await?,
    };

    info!(id = link.id, slug = %link.slug, "created link");

    let qr_target = short_url(&state.config.public_base_url, &link.slug);
    let qr_png = tokio::task::spawn_blocking(move || render_data_uri(&qr_target))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok((StatusCode::CREATED, Json(CreatedLink { link, qr_png })))
}

/// Insert under freshly generated slugs until one is free
async fn allocate_generated(state: &AppState, url: &str) -> Result<Link, ApiError> {
    let slugs = &state.config.slugs;

    for attempt in 1..=slugs.max_attempts {
        let slug = generate_slug(slugs.length);
        match state.storage.create_with_slug(&slug, url).await {
            Ok(link) => return Ok(link),
            Err(StorageError::Conflict) => {
                debug!(attempt, slug = %slug, "generated slug already taken");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::warn!(
        attempts = slugs.max_attempts,
        length = slugs.length,
        "giving up on slug generation"
    );
    Err(ApiError::SlugSpaceExhausted)
}

/// List links, newest first
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<LinkList>, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.clamp(1, MAX_LIST_LIMIT);
    let offset = query.offset.max(0);

    let items = state.storage.list(limit, offset).await?;
    let total = state.storage.count().await?;

    Ok(Json(LinkList { items, total }))
}

/// Get a link by slug
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    slug: Result<Path<String>, PathRejection>,
) -> Result<Json<Link>, ApiError> {
    let Path(slug) = slug?;

    state
        .storage
        .get_authoritative(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))
}

/// Delete a link by id
///
/// Deleting an id that does not exist (including one deleted earlier) is a 404.
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(raw_id) = id?;
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("Link id must be an integer, got '{raw_id}'")))?;

    match state.storage.delete(id).await? {
        Some(link) => {
            info!(id, slug = %link.slug, "deleted link");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("Not found".to_string())),
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
