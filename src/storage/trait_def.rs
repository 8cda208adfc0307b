use crate::models::Link;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("slug already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a link under the given slug.
    ///
    /// Fails with [`StorageError::Conflict`] when the slug is taken; the check
    /// and the insert are a single statement so concurrent callers cannot both
    /// win.
    async fn create_with_slug(&self, slug: &str, url: &str) -> StorageResult<Link>;

    /// Get a link by slug
    async fn get(&self, slug: &str) -> Result<Option<Link>>;

    /// Get a link by slug, bypassing caches and including pending clicks
    async fn get_authoritative(&self, slug: &str) -> Result<Option<Link>> {
        self.get(slug).await
    }

    /// Delete a link by id, returning the removed link
    async fn delete(&self, id: i64) -> Result<Option<Link>>;

    /// Add `amount` clicks to the link with the given id
    async fn increment_clicks(&self, id: i64, amount: u64) -> Result<()>;

    /// List links, newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Link>>;

    /// Number of stored links
    async fn count(&self) -> Result<i64>;
}

pub(crate) fn unix_now() -> Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64)
}
