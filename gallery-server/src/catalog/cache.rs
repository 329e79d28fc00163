//! Catalog Cache
//!
//! Read-through cache of whole collections. No TTL: entries live until an
//! explicit invalidation (admin mutation, cache clear) or a forced refresh.
//!
//! Each slot holds `Option<Arc<T>>` behind a `RwLock`. The lock is never held
//! across a fetch, so concurrent misses may each fetch; the last `set` wins.
//! A failed fetch never touches the slot.

use gallery_common::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::painting::PaintingSet;

/// Logical cache entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    Paintings,
    Categories,
    Tags,
}

/// One cached collection: EMPTY or POPULATED
pub struct CacheSlot<T> {
    value: RwLock<Option<Arc<T>>>,
}

impl<T> Default for CacheSlot<T> {
    fn default() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }
}

impl<T> CacheSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, or `None` when empty
    pub async fn get(&self) -> Option<Arc<T>> {
        self.value.read().await.clone()
    }

    /// Replace the cached value
    pub async fn set(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        *self.value.write().await = Some(Arc::clone(&value));
        value
    }

    pub async fn invalidate(&self) {
        *self.value.write().await = None;
    }

    pub async fn is_populated(&self) -> bool {
        self.value.read().await.is_some()
    }

    /// Return the cached value unless `force_refresh` or empty; otherwise run
    /// `fetcher` and store its result. Fetch errors leave the slot untouched.
    pub async fn get_or_fetch<F, Fut>(&self, force_refresh: bool, fetcher: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !force_refresh {
            if let Some(cached) = self.get().await {
                return Ok(cached);
            }
        }

        let fresh = fetcher().await?;
        Ok(self.set(fresh).await)
    }
}

/// All catalog collections, owned by one `CatalogService`
#[derive(Default)]
pub struct CatalogCache {
    pub paintings: CacheSlot<PaintingSet>,
    pub categories: CacheSlot<Vec<String>>,
    pub tags: CacheSlot<Vec<String>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear one entry, or every entry when `key` is `None`
    pub async fn invalidate(&self, key: Option<CacheKey>) {
        match key {
            Some(CacheKey::Paintings) => self.paintings.invalidate().await,
            Some(CacheKey::Categories) => self.categories.invalidate().await,
            Some(CacheKey::Tags) => self.tags.invalidate().await,
            None => {
                self.paintings.invalidate().await;
                self.categories.invalidate().await;
                self.tags.invalidate().await;
            }
        }
        tracing::debug!(?key, "Catalog cache invalidated");
    }
}
