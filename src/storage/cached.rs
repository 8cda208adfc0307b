use crate::models::Link;
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;

/// Cached storage wrapper that implements read caching and write buffering
pub struct CachedStorage {
    /// Underlying storage implementation
    inner: Arc<dyn Storage>,
    /// Read cache for slug lookups (Moka cache)
    read_cache: Cache<String, Option<Link>>,
    /// Write buffer for click increments, keyed by link id (DashMap)
    click_buffer: Arc<DashMap<i64, u64>>,
    /// Bumped by every delete; a lookup that overlapped one drops what it cached
    delete_epoch: AtomicU64,
    /// Shutdown signal sender
    shutdown_tx: watch::Sender<bool>,
}

impl CachedStorage {
    pub fn new(
        inner: Arc<dyn Storage>,
        max_cache_entries: u64,
        cache_ttl_secs: u64,
        flush_interval_secs: u64,
    ) -> Self {
        let read_cache = Cache::builder()
            .max_capacity(max_cache_entries)
            .time_to_live(Duration::from_secs(cache_ttl_secs.max(1)))
            .build();

        let click_buffer = Arc::new(DashMap::new());
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        // Start background task to flush click buffer periodically
        let storage = Arc::clone(&inner);
        let buffer = Arc::clone(&click_buffer);
        tokio::spawn(async move {
            let period = Duration::from_secs(flush_interval_secs.max(1));
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = flush_click_buffer(&storage, &buffer).await {
                            tracing::error!("Failed to flush click buffer: {}", e);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::debug!("Click flush task stopped");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            inner,
            read_cache,
            click_buffer,
            delete_epoch: AtomicU64::new(0),
            shutdown_tx,
        }
    }

    /// Cache a value read from the database while `epoch` was current.
    ///
    /// A delete that ran during the read may already have invalidated the
    /// slug, so the entry is dropped again whenever the epoch moved.
    async fn cache_loaded(&self, slug: &str, value: Option<Link>, epoch: u64) {
        self.read_cache.insert(slug.to_string(), value).await;
        if self.delete_epoch.load(Ordering::SeqCst) != epoch {
            self.read_cache.invalidate(slug).await;
        }
    }

    /// Persist all buffered clicks now
    pub async fn flush(&self) -> Result<()> {
        flush_click_buffer(&self.inner, &self.click_buffer).await
    }

    /// Stop the background flusher and persist whatever is still buffered
    pub async fn shutdown(&self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        tracing::info!("Shutdown signal received, flushing click buffer...");
        self.flush().await?;
        tracing::info!("Click buffer flushed successfully on shutdown");
        Ok(())
    }

    /// Get buffered click count for a link
    fn get_buffered_clicks(&self, id: i64) -> i64 {
        self.click_buffer
            .get(&id)
            .map(|entry| *entry.value() as i64)
            .unwrap_or(0)
    }
}

/// Flush accumulated clicks to the database
async fn flush_click_buffer(storage: &Arc<dyn Storage>, buffer: &DashMap<i64, u64>) -> Result<()> {
    // Collect increments while zeroing counts so concurrent writers can continue
    let pending_updates = buffer
        .iter_mut()
        .filter_map(|mut entry| {
            let count = *entry.value();
            if count == 0 {
                return None;
            }

            *entry.value_mut() = 0;
            Some((*entry.key(), count))
        })
        .collect::<Vec<(i64, u64)>>();

    // Remove empty entries in case no new clicks were buffered meanwhile
    buffer.retain(|_, v| *v > 0);

    for (idx, (id, count)) in pending_updates.iter().enumerate() {
        if let Err(e) = storage.increment_clicks(*id, *count).await {
            // Put back everything not yet persisted so no click is dropped
            for (id, count) in &pending_updates[idx..] {
                *buffer.entry(*id).or_insert(0) += *count;
            }
            return Err(e);
        }
    }

    if !pending_updates.is_empty() {
        tracing::debug!(links = pending_updates.len(), "flushed buffered clicks");
    }

    Ok(())
}

#[async_trait]
impl Storage for CachedStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn create_with_slug(&self, slug: &str, url: &str) -> StorageResult<Link> {
        let result = self.inner.create_with_slug(slug, url).await?;

        // Cache the newly created link, replacing any cached miss
        self.read_cache
            .insert(slug.to_string(), Some(result.clone()))
            .await;

        Ok(result)
    }

    async fn get(&self, slug: &str) -> Result<Option<Link>> {
        if let Some(cached) = self.read_cache.get(slug).await {
            return Ok(cached);
        }

        // Cache miss - fetch from underlying storage
        let epoch = self.delete_epoch.load(Ordering::SeqCst);
        let result = self.inner.get(slug).await?;

        // Cache the result from database (without buffered clicks to avoid double-counting)
        self.cache_loaded(slug, result.clone(), epoch).await;

        Ok(result)
    }

    async fn get_authoritative(&self, slug: &str) -> Result<Option<Link>> {
        let epoch = self.delete_epoch.load(Ordering::SeqCst);
        let db_value = self.inner.get(slug).await?;

        // Keep cache in sync with the latest database read
        self.cache_loaded(slug, db_value.clone(), epoch).await;

        let mut result = db_value;
        if let Some(ref mut link) = result {
            link.clicks += self.get_buffered_clicks(link.id);
        }

        Ok(result)
    }

    async fn delete(&self, id: i64) -> Result<Option<Link>> {
        let deleted = self.inner.delete(id).await?;

        if let Some(ref link) = deleted {
            self.delete_epoch.fetch_add(1, Ordering::SeqCst);
            self.read_cache.invalidate(&link.slug).await;
            self.click_buffer.remove(&id);
        }

        Ok(deleted)
    }

    async fn increment_clicks(&self, id: i64, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }

        // Buffer the click increment in memory
        *self.click_buffer.entry(id).or_insert(0) += amount;

        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Link>> {
        let mut links = self.inner.list(limit, offset).await?;

        // Add buffered clicks to each link
        for link in &mut links {
            link.clicks += self.get_buffered_clicks(link.id);
        }

        Ok(links)
    }

    async fn count(&self) -> Result<i64> {
        self.inner.count().await
    }
}
