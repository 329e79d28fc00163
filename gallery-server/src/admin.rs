//! Admin Mutation Operations
//!
//! Write-through to the backing store followed by a full cache
//! invalidation (categories and tags derive from paintings). Unlike reads,
//! every failure propagates to the caller.

use gallery_common::{Error, Result};
use std::sync::Arc;
use tracing::info;

use crate::catalog::normalizer::is_reserved_tag;
use crate::catalog::CatalogService;
use crate::source::MetadataSource;

pub struct AdminService {
    catalog: Arc<CatalogService>,
    admin_password: Option<String>,
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn unknown(id: &str) -> Error {
    Error::NotFound(format!("painting {}", id))
}

/// Byte-wise comparison whose duration does not depend on where inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl AdminService {
    pub fn new(catalog: Arc<CatalogService>, admin_password: Option<String>) -> Self {
        Self {
            catalog,
            admin_password,
        }
    }

    fn source(&self) -> &Arc<dyn MetadataSource> {
        self.catalog.source()
    }

    async fn committed(&self, operation: &str, id: &str, found: bool) -> Result<()> {
        if !found {
            return Err(unknown(id));
        }
        self.catalog.invalidate(None).await;
        info!(operation, painting_id = id, "Admin mutation applied");
        Ok(())
    }

    pub async fn set_published(&self, id: &str, published: bool) -> Result<()> {
        require(id, "imageId")?;
        let found = self.source().set_published(id, published).await?;
        self.committed("setPublished", id, found).await
    }

    pub async fn set_label_number(&self, id: &str, label_number: &str) -> Result<()> {
        require(id, "imageId")?;
        require(label_number, "labelNumber")?;
        let found = self.source().set_label_number(id, label_number).await?;
        self.committed("setLabelNumber", id, found).await
    }

    /// Mark a painting verified if its stored label equals `label_number`
    pub async fn verify_label(&self, id: &str, label_number: &str) -> Result<()> {
        require(id, "imageId")?;
        require(label_number, "labelNumber")?;

        let record = self
            .source()
            .fetch_record(id)
            .await?
            .ok_or_else(|| unknown(id))?;

        let stored = record.label_number.unwrap_or_default();
        if stored != label_number {
            return Err(Error::Mismatch(format!(
                "stored label number '{}' does not match '{}'",
                stored, label_number
            )));
        }

        let found = self.source().set_verified(id, true).await?;
        self.committed("verifyLabel", id, found).await
    }

    /// Add a regular tag; reserved-prefix tags are rejected
    pub async fn add_tag(&self, id: &str, tag: &str) -> Result<()> {
        require(id, "imageId")?;
        require(tag, "tag")?;
        if is_reserved_tag(tag) {
            return Err(Error::Validation(format!("tag '{}' uses a reserved prefix", tag)));
        }
        let found = self.source().add_tag(id, tag).await?;
        self.committed("addTag", id, found).await
    }

    pub async fn remove_tag(&self, id: &str, tag: &str) -> Result<()> {
        require(id, "imageId")?;
        require(tag, "tag")?;
        let found = self.source().remove_tag(id, tag).await?;
        self.committed("removeTag", id, found).await
    }

    /// Check an admin password.
    ///
    /// `Config` when no password is configured: authentication fails closed.
    pub fn verify_password(&self, candidate: &str) -> Result<bool> {
        let expected = self
            .admin_password
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::Config("admin password is not configured".to_string()))?;
        Ok(constant_time_eq(expected.as_bytes(), candidate.as_bytes()))
    }
}
