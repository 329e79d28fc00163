//! Catalog Service
//!
//! Read side of the gallery. Every operation tolerates backing-store
//! failure: lists degrade to empty, lookups to `None`, and the failure is
//! recorded in [`Diagnostics`].

use gallery_common::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use super::cache::{CacheKey, CatalogCache};
use super::diagnostics::Diagnostics;
use super::normalizer::Normalizer;
use super::painting::{Painting, PaintingSet};
use crate::source::MetadataSource;

pub struct CatalogService {
    source: Arc<dyn MetadataSource>,
    normalizer: Normalizer,
    cache: CatalogCache,
    diagnostics: Arc<Diagnostics>,
    /// Curated category list; overrides source listing and derivation
    configured_categories: Option<Vec<String>>,
}

impl CatalogService {
    pub fn new(
        source: Arc<dyn MetadataSource>,
        normalizer: Normalizer,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            source,
            normalizer,
            cache: CatalogCache::new(),
            diagnostics,
            configured_categories: None,
        }
    }

    /// Serve this category list verbatim from `list_categories`
    pub fn with_categories(mut self, categories: Option<Vec<String>>) -> Self {
        self.configured_categories = categories.filter(|c| !c.is_empty());
        self
    }

    pub fn source(&self) -> &Arc<dyn MetadataSource> {
        &self.source
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Clear one cache entry, or all of them
    pub async fn invalidate(&self, key: Option<CacheKey>) {
        self.cache.invalidate(key).await;
    }

    async fn painting_set(&self, force_refresh: bool) -> Result<Arc<PaintingSet>> {
        self.cache
            .paintings
            .get_or_fetch(force_refresh, || async {
                let raws = self.source.fetch_records().await?;
                let set = PaintingSet::new(self.normalizer.normalize_all(raws));
                debug!(
                    source = self.source.name(),
                    count = set.len(),
                    "Fetched paintings"
                );
                Ok(set)
            })
            .await
    }

    /// All paintings; unpublished ones only in admin mode
    pub async fn list_paintings(&self, force_refresh: bool, admin: bool) -> Vec<Painting> {
        match self.painting_set(force_refresh).await {
            Ok(set) => set.visible(admin),
            Err(e) => {
                self.diagnostics.record("listPaintings", &e);
                Vec::new()
            }
        }
    }

    /// One painting by id; unpublished paintings are absent outside admin mode
    pub async fn get_painting(&self, id: &str, admin: bool) -> Option<Painting> {
        let visible = |p: &Painting| admin || p.published;

        if let Some(set) = self.cache.paintings.get().await {
            if let Some(painting) = set.get(id) {
                return visible(painting).then(|| painting.clone());
            }
        }

        let raw = match self.source.fetch_record(id).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                self.diagnostics.record("getPainting", &e);
                return None;
            }
        };

        match self.normalizer.normalize(raw) {
            Ok(painting) => visible(&painting).then_some(painting),
            Err(e) => {
                self.diagnostics.record("getPainting", &e);
                None
            }
        }
    }

    /// Distinct categories.
    ///
    /// Configured list first, then the store's own listing, then the
    /// categories of published paintings (sorted, empty ones skipped).
    pub async fn list_categories(&self, force_refresh: bool) -> Vec<String> {
        if let Some(categories) = &self.configured_categories {
            return categories.clone();
        }

        let result = self
            .cache
            .categories
            .get_or_fetch(force_refresh, || async {
                if let Some(listed) = self.source.fetch_categories().await? {
                    return Ok(listed);
                }
                let set = self.painting_set(force_refresh).await?;
                let derived: BTreeSet<&str> = set
                    .iter()
                    .filter(|p| p.published && !p.category.is_empty())
                    .map(|p| p.category.as_str())
                    .collect();
                Ok(derived.into_iter().map(str::to_string).collect())
            })
            .await;

        match result {
            Ok(categories) => categories.as_ref().clone(),
            Err(e) => {
                self.diagnostics.record("listCategories", &e);
                Vec::new()
            }
        }
    }

    /// Distinct regular tags of published paintings, sorted
    pub async fn list_tags(&self, force_refresh: bool) -> Vec<String> {
        let result = self
            .cache
            .tags
            .get_or_fetch(force_refresh, || async {
                let set = self.painting_set(force_refresh).await?;
                let tags: BTreeSet<&str> = set
                    .iter()
                    .filter(|p| p.published)
                    .flat_map(|p| p.tags.iter().map(String::as_str))
                    .collect();
                Ok(tags.into_iter().map(str::to_string).collect())
            })
            .await;

        match result {
            Ok(tags) => tags.as_ref().clone(),
            Err(e) => {
                self.diagnostics.record("listTags", &e);
                Vec::new()
            }
        }
    }

    /// Paintings whose category equals `category` exactly
    pub async fn list_paintings_by_category(
        &self,
        category: &str,
        force_refresh: bool,
        admin: bool,
    ) -> Vec<Painting> {
        self.list_paintings(force_refresh, admin)
            .await
            .into_iter()
            .filter(|p| p.category == category)
            .collect()
    }
}
