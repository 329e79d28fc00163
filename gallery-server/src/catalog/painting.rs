//! Canonical painting entity and the id-indexed collection cached by the catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One artwork as served to public and admin clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Painting {
    pub id: String,
    /// Always non-empty; see `normalizer::resolve_title`
    pub title: String,
    /// Empty when undetermined
    pub category: String,
    /// Regular tags only; reserved-prefix tags never appear here
    pub tags: BTreeSet<String>,
    pub image_url: String,
    pub original_image_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: String,
    pub created: Option<DateTime<Utc>>,
    pub label_number: Option<String>,
    pub verified: bool,
    pub published: bool,
}

/// Paintings in source order with O(1) lookup by id
#[derive(Debug, Clone, Default)]
pub struct PaintingSet {
    items: Vec<Painting>,
    by_id: HashMap<String, usize>,
}

impl PaintingSet {
    /// Build the set; later duplicates of an id are dropped
    pub fn new(paintings: Vec<Painting>) -> Self {
        let mut items = Vec::with_capacity(paintings.len());
        let mut by_id = HashMap::with_capacity(paintings.len());

        for painting in paintings {
            if by_id.contains_key(&painting.id) {
                tracing::warn!(painting_id = %painting.id, "Duplicate painting id ignored");
                continue;
            }
            by_id.insert(painting.id.clone(), items.len());
            items.push(painting);
        }

        Self { items, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Painting> {
        self.by_id.get(id).map(|&i| &self.items[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Painting> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Paintings visible for the given mode: all for admin, published otherwise
    pub fn visible(&self, admin: bool) -> Vec<Painting> {
        self.items
            .iter()
            .filter(|p| admin || p.published)
            .cloned()
            .collect()
    }
}
