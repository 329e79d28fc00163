//! Metadata Source Adapters
//!
//! Every backing store (relational rows, object tags) is wrapped in a
//! [`MetadataSource`] that hands out provider-agnostic [`RawRecord`]s. The
//! normalizer is written once against that shape; nothing above this module
//! knows which store is configured.

pub mod cloudinary;
pub mod retry;
pub mod sqlite;

pub use cloudinary::CloudinarySource;
pub use retry::{RetryPolicy, RetryingSource};
pub use sqlite::SqliteSource;

use async_trait::async_trait;
use gallery_common::Result;
use serde::{Deserialize, Serialize};

/// A boolean as stored by the various schemas: a real bool, or text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    Bool(bool),
    Text(String),
}

impl RawFlag {
    /// `Bool(b)` is `b`; text is true only when it is exactly `"true"`.
    pub fn as_bool(&self) -> bool {
        match self {
            RawFlag::Bool(b) => *b,
            RawFlag::Text(s) => s == "true",
        }
    }
}

impl From<bool> for RawFlag {
    fn from(b: bool) -> Self {
        RawFlag::Bool(b)
    }
}

/// Provider-shaped painting record, before normalization.
///
/// Every field is optional: adapters copy what the store has and leave the
/// defaulting rules to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Opaque asset key; records without one are rejected by the normalizer
    pub id: Option<String>,
    pub label_number: Option<String>,
    /// Free-text caption / description
    pub caption: Option<String>,
    /// Slash-delimited folder-like path used for category derivation
    pub folder: Option<String>,
    /// Explicit category field, preferred over the folder when present
    pub category: Option<String>,
    /// Storage path or public id handed to the image URL builder
    pub asset_path: Option<String>,
    /// Raw tags, possibly including reserved-prefix tags
    #[serde(default)]
    pub tags: Vec<String>,
    pub published: Option<RawFlag>,
    pub verified: Option<RawFlag>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub format: Option<String>,
    /// Ingestion timestamp as the store renders it
    pub created: Option<String>,
}

/// Read and write access to one backing store.
///
/// Write methods return `Ok(false)` when the id is unknown to the store; the
/// admin layer turns that into `NotFound`.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Store name for logs
    fn name(&self) -> &'static str;

    /// All painting records
    async fn fetch_records(&self) -> Result<Vec<RawRecord>>;

    /// One painting record by id
    async fn fetch_record(&self, id: &str) -> Result<Option<RawRecord>>;

    /// Category listing straight from the store, if it has one
    async fn fetch_categories(&self) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    async fn set_published(&self, id: &str, published: bool) -> Result<bool>;

    async fn set_label_number(&self, id: &str, label_number: &str) -> Result<bool>;

    async fn set_verified(&self, id: &str, verified: bool) -> Result<bool>;

    /// Add a tag; adding a tag the painting already has succeeds
    async fn add_tag(&self, id: &str, tag: &str) -> Result<bool>;

    /// Remove a tag; removing an absent tag succeeds
    async fn remove_tag(&self, id: &str, tag: &str) -> Result<bool>;
}

#[async_trait]
impl<S: MetadataSource + ?Sized> MetadataSource for std::sync::Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        (**self).fetch_records().await
    }

    async fn fetch_record(&self, id: &str) -> Result<Option<RawRecord>> {
        (**self).fetch_record(id).await
    }

    async fn fetch_categories(&self) -> Result<Option<Vec<String>>> {
        (**self).fetch_categories().await
    }

    async fn set_published(&self, id: &str, published: bool) -> Result<bool> {
        (**self).set_published(id, published).await
    }

    async fn set_label_number(&self, id: &str, label_number: &str) -> Result<bool> {
        (**self).set_label_number(id, label_number).await
    }

    async fn set_verified(&self, id: &str, verified: bool) -> Result<bool> {
        (**self).set_verified(id, verified).await
    }

    async fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        (**self).add_tag(id, tag).await
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        (**self).remove_tag(id, tag).await
    }
}
